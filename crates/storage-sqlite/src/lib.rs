//! SQLite persistence for the care-home MAR, built on diesel.
//!
//! Reads go through the r2d2 pool; every write is funnelled through the
//! single writer thread in [`db::write_actor`] so that an entity and its
//! sync queue item always commit together.

pub mod db;
pub mod errors;
pub mod schema;
pub(crate) mod utils;

pub mod clinical;
pub mod consents;
pub mod medications;
pub mod residents;
pub mod signatures;
pub mod staff;
pub mod stock;
pub mod sync_queue;

pub use db::{create_pool, get_connection, init, run_migrations, spawn_writer, DbPool, WriteHandle};
pub use errors::StorageError;

pub use clinical::InteractionRepository;
pub use consents::ConsentRepository;
pub use medications::MedicationRepository;
pub use residents::ResidentRepository;
pub use signatures::SignatureRepository;
pub use staff::StaffCredentialRepository;
pub use stock::StockRepository;
pub use sync_queue::{enqueue_sync_item, SyncQueueRepository};
