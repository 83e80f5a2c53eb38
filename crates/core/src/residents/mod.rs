//! Residents: the people medication is administered to.

mod residents_model;
mod residents_traits;

pub use residents_model::*;
pub use residents_traits::*;
