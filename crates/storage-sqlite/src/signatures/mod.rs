mod model;
mod repository;

pub use model::SignatureDB;
pub use repository::SignatureRepository;
