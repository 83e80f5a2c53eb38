mod model;
mod repository;

pub use model::StaffCredentialDB;
pub use repository::StaffCredentialRepository;
