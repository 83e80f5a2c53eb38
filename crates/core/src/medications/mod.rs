//! Medication schedules, administration records and the safety pipeline
//! that guards recording a dose.

mod medications_model;
mod medications_service;
mod medications_traits;
mod safety_checks;

pub use medications_model::*;
pub use medications_service::*;
pub use medications_traits::*;
pub use safety_checks::*;
