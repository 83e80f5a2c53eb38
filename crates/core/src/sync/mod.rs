//! Offline sync queue: domain models, retry policy and the service that
//! pushes queued records to the central server.

mod offline_sync_service;
mod sync_policy;
mod sync_queue_model;

pub use offline_sync_service::*;
pub use sync_policy::*;
pub use sync_queue_model::*;
