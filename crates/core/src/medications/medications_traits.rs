use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{
    AdministrationOutcome, AdministrationRequest, Medication, MedicationAdministration,
    MedicationSchedule, NewMedication, NewMedicationAdministration, NewMedicationSchedule,
    ScheduleConflict, ScheduleStatus,
};
use crate::errors::Result;

#[async_trait]
pub trait MedicationRepositoryTrait: Send + Sync {
    fn get_medication(&self, medication_id: &str) -> Result<Option<Medication>>;

    fn get_schedule(&self, schedule_id: &str) -> Result<Option<MedicationSchedule>>;

    fn list_active_schedules_for_resident(
        &self,
        resident_id: &str,
    ) -> Result<Vec<MedicationSchedule>>;

    fn get_administration(&self, record_id: &str) -> Result<Option<MedicationAdministration>>;

    /// Records for a resident, newest first, optionally limited to those at or
    /// after `since`.
    fn list_administrations_for_resident(
        &self,
        resident_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MedicationAdministration>>;

    /// Most recent GIVEN record for a schedule.
    fn last_given_for_schedule(&self, schedule_id: &str)
        -> Result<Option<MedicationAdministration>>;

    /// Sum of GIVEN doses of a medication for a resident at or after `since`.
    fn total_given_since(
        &self,
        resident_id: &str,
        medication_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Decimal>;

    async fn insert_medication(&self, new_medication: NewMedication) -> Result<Medication>;

    async fn insert_schedule(&self, new_schedule: NewMedicationSchedule)
        -> Result<MedicationSchedule>;

    async fn update_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<MedicationSchedule>;

    async fn insert_administration(
        &self,
        record: NewMedicationAdministration,
    ) -> Result<MedicationAdministration>;

    /// Signs an unsigned record. Fails with `RECORD_SIGNED` if already signed.
    async fn sign_administration(
        &self,
        record_id: &str,
        signed_by: &str,
        signed_at: DateTime<Utc>,
    ) -> Result<MedicationAdministration>;

    /// Replaces the notes of an unsigned record. Fails with `RECORD_SIGNED`
    /// if already signed.
    async fn update_administration_notes(
        &self,
        record_id: &str,
        notes: Option<String>,
    ) -> Result<MedicationAdministration>;
}

#[async_trait]
pub trait MedicationServiceTrait: Send + Sync {
    fn get_medication(&self, medication_id: &str) -> Result<Medication>;

    async fn create_medication(&self, new_medication: NewMedication) -> Result<Medication>;

    async fn create_schedule(&self, new_schedule: NewMedicationSchedule)
        -> Result<MedicationSchedule>;

    async fn discontinue_schedule(&self, schedule_id: &str) -> Result<MedicationSchedule>;

    /// Runs PIN verification and safety checks, then records the dose.
    async fn record_administration(
        &self,
        schedule_id: &str,
        request: AdministrationRequest,
    ) -> Result<AdministrationOutcome>;

    async fn sign_administration(
        &self,
        record_id: &str,
        staff_id: &str,
    ) -> Result<MedicationAdministration>;

    async fn amend_notes(
        &self,
        record_id: &str,
        notes: Option<String>,
    ) -> Result<MedicationAdministration>;

    fn list_administrations_for_resident(
        &self,
        resident_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MedicationAdministration>>;

    fn detect_schedule_conflicts(&self, resident_id: &str) -> Result<Vec<ScheduleConflict>>;
}
