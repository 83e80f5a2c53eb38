mod model;
mod repository;

pub use model::ResidentDB;
pub use repository::ResidentRepository;
