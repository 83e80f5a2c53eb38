mod model;
mod repository;

pub use model::ConsentDB;
pub use repository::ConsentRepository;
