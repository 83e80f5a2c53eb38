mod model;
mod repository;

pub use model::StockLevelDB;
pub use repository::StockRepository;
