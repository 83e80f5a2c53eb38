//! Captured signatures, encrypted at rest and queued for the central server.

mod signatures_model;
mod signatures_service;
mod signatures_traits;

pub use signatures_model::*;
pub use signatures_service::*;
pub use signatures_traits::*;
