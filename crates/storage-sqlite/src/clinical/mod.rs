mod model;
mod repository;

pub use model::DrugInteractionDB;
pub use repository::InteractionRepository;
