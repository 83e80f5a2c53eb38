use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{
    AllergyFinding, ClinicalSafetyReport, ContraindicationFinding, DosageValidation,
    DrugInteraction, InteractionFinding, NewDrugInteraction,
};
use crate::errors::Result;

#[async_trait]
pub trait InteractionRepositoryTrait: Send + Sync {
    /// Interactions between `medication_id` and any of `other_medication_ids`.
    fn find_interactions(
        &self,
        medication_id: &str,
        other_medication_ids: &[String],
    ) -> Result<Vec<DrugInteraction>>;

    async fn insert_interaction(&self, interaction: NewDrugInteraction) -> Result<DrugInteraction>;
}

#[async_trait]
pub trait ClinicalDecisionSupportServiceTrait: Send + Sync {
    /// Interactions between the medication and the resident's other active
    /// schedules.
    async fn check_interactions(
        &self,
        resident_id: &str,
        medication_id: &str,
    ) -> Result<Vec<InteractionFinding>>;

    async fn check_allergies(
        &self,
        resident_id: &str,
        medication_id: &str,
    ) -> Result<Vec<AllergyFinding>>;

    async fn check_contraindications(
        &self,
        resident_id: &str,
        medication_id: &str,
    ) -> Result<Vec<ContraindicationFinding>>;

    /// Validates a proposed dose against the trailing 24 hour maximum.
    async fn validate_dosage(
        &self,
        resident_id: &str,
        medication_id: &str,
        dose: Decimal,
        at: DateTime<Utc>,
    ) -> Result<DosageValidation>;

    /// Runs every check concurrently and composes one verdict.
    async fn perform_safety_check(
        &self,
        resident_id: &str,
        medication_id: &str,
        dose: Decimal,
        at: DateTime<Utc>,
    ) -> Result<ClinicalSafetyReport>;
}
