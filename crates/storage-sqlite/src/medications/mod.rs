mod model;
mod repository;

pub use model::{MedicationAdministrationDB, MedicationDB, MedicationScheduleDB};
pub use repository::MedicationRepository;
