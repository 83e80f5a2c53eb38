use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::stock::StockAlert;

use super::SafetyCheckResult;

/// Minimum spacing between two doses when a medication does not define one.
pub const DEFAULT_MIN_DOSE_INTERVAL_MINUTES: i32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    /// Allergen classes this medication belongs to, e.g. "penicillins".
    pub allergen_classes: Vec<String>,
    /// Conditions under which this medication must not be given.
    pub contraindications: Vec<String>,
    pub max_daily_dose: Option<Decimal>,
    pub min_interval_minutes: i32,
    pub is_controlled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    pub id: Option<String>,
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    #[serde(default)]
    pub allergen_classes: Vec<String>,
    #[serde(default)]
    pub contraindications: Vec<String>,
    pub max_daily_dose: Option<Decimal>,
    pub min_interval_minutes: Option<i32>,
    #[serde(default)]
    pub is_controlled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Suspended,
    Discontinued,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSchedule {
    pub id: String,
    pub resident_id: String,
    pub medication_id: String,
    /// Times of day (UTC) at which a dose is due.
    pub times: Vec<NaiveTime>,
    pub frequency: String,
    pub dose: Decimal,
    pub unit: String,
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicationSchedule {
    pub id: Option<String>,
    pub resident_id: String,
    pub medication_id: String,
    pub times: Vec<NaiveTime>,
    pub frequency: String,
    pub dose: Decimal,
    pub unit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdministrationStatus {
    Given,
    Missed,
    Refused,
    Pending,
}

/// One MAR entry. Immutable once `signed_at` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdministration {
    pub id: String,
    pub schedule_id: String,
    pub resident_id: String,
    pub medication_id: String,
    pub status: AdministrationStatus,
    pub dose: Decimal,
    pub administered_by: String,
    pub witnessed_by: Option<String>,
    pub administered_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub signed_by: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MedicationAdministration {
    pub fn is_signed(&self) -> bool {
        self.signed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicationAdministration {
    pub schedule_id: String,
    pub resident_id: String,
    pub medication_id: String,
    pub status: AdministrationStatus,
    pub dose: Decimal,
    pub administered_by: String,
    pub witnessed_by: Option<String>,
    pub administered_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Data captured at the point of administration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrationRequest {
    pub status: AdministrationStatus,
    pub administered_by: String,
    pub witnessed_by: Option<String>,
    pub staff_pin: Option<String>,
    pub witness_pin: Option<String>,
    /// Defaults to now.
    pub administered_at: Option<DateTime<Utc>>,
    /// Defaults to the scheduled dose.
    pub dose: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdministrationOutcome {
    pub record: MedicationAdministration,
    pub safety_checks: Vec<SafetyCheckResult>,
    /// Messages from checks that failed under a warn-only policy.
    pub warnings: Vec<String>,
    pub stock_alerts: Vec<StockAlert>,
}

/// Two active schedules of the same medication whose dose times are closer
/// than the medication's minimum interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConflict {
    pub medication_id: String,
    pub first_schedule_id: String,
    pub second_schedule_id: String,
    pub first_time: NaiveTime,
    pub second_time: NaiveTime,
    pub gap_minutes: i64,
}
