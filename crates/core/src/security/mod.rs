//! Staff PIN hashing and at-rest encryption helpers.

pub mod crypto;
mod pin;
mod staff_pin_service;

pub use crypto::RootKey;
pub use pin::{hash_pin, validate_pin_format, verify_pin};
pub use staff_pin_service::*;
