//! Clinical decision support: interaction, allergy, contraindication and
//! dosage checks composed into one verdict.

mod clinical_model;
mod clinical_service;
mod clinical_traits;

pub use clinical_model::*;
pub use clinical_service::*;
pub use clinical_traits::*;
