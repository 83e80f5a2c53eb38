mod model;
mod repository;

pub use model::SyncQueueItemDB;
pub use repository::{enqueue_sync_item, SyncQueueRepository};
