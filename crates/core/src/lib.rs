//! Domain core for the care-home medication administration record (MAR).
//!
//! This crate holds models, repository and service traits, and the services
//! that implement medication safety checks, stock tracking, consent and
//! signature capture, and the offline sync queue. Persistence lives in
//! `carehome-storage-sqlite`; transport lives in `carehome-sync-client`.

pub mod clinical;
pub mod consents;
pub mod errors;
pub mod events;
pub mod medications;
pub mod residents;
pub mod security;
pub mod signatures;
pub mod stock;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{Error, Result};
