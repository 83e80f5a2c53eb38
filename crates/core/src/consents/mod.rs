//! Resident consent records, queued for the central server on every change.

mod consents_model;
mod consents_service;
mod consents_traits;

pub use consents_model::*;
pub use consents_service::*;
pub use consents_traits::*;
