//! Pure safety rules evaluated before a dose is recorded.
//!
//! Each rule returns a [`SafetyCheckResult`]; the medication service gathers
//! them and applies the [`SafetyPolicy`] to decide which failures block.

use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clinical::{AllergyFinding, InteractionFinding, InteractionSeverity};
use crate::utils::time_utils::minutes_between_times_of_day;

/// Default tolerance either side of a scheduled time.
pub const DEFAULT_TIMING_WINDOW_MINUTES: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyCheckKind {
    DrugInteraction,
    Allergy,
    DuplicateDose,
    MaxDailyDose,
    TimingWindow,
    StockAvailability,
}

impl SafetyCheckKind {
    pub const ALL: [SafetyCheckKind; 6] = [
        SafetyCheckKind::DrugInteraction,
        SafetyCheckKind::Allergy,
        SafetyCheckKind::DuplicateDose,
        SafetyCheckKind::MaxDailyDose,
        SafetyCheckKind::TimingWindow,
        SafetyCheckKind::StockAvailability,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyCheckResult {
    pub kind: SafetyCheckKind,
    pub passed: bool,
    pub message: Option<String>,
}

impl SafetyCheckResult {
    pub fn pass(kind: SafetyCheckKind) -> Self {
        Self {
            kind,
            passed: true,
            message: None,
        }
    }

    pub fn pass_with_note(kind: SafetyCheckKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            passed: true,
            message: Some(message.into()),
        }
    }

    pub fn fail(kind: SafetyCheckKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            passed: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Enforcement {
    /// A failure rejects the administration.
    Block,
    /// A failure is reported back as a warning; the dose is still recorded.
    Warn,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyPolicy {
    /// Require staff PIN verification for every GIVEN dose, not only
    /// controlled drugs.
    pub require_pin: bool,
    pub timing_window_minutes: i64,
    /// Zone the schedule times are written in.
    pub timezone: Tz,
    enforcement: HashMap<SafetyCheckKind, Enforcement>,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            require_pin: false,
            timing_window_minutes: DEFAULT_TIMING_WINDOW_MINUTES,
            timezone: chrono_tz::UTC,
            enforcement: SafetyCheckKind::ALL
                .iter()
                .map(|kind| (*kind, Enforcement::Block))
                .collect(),
        }
    }
}

impl SafetyPolicy {
    pub fn with_enforcement(mut self, kind: SafetyCheckKind, enforcement: Enforcement) -> Self {
        self.enforcement.insert(kind, enforcement);
        self
    }

    pub fn with_require_pin(mut self, require_pin: bool) -> Self {
        self.require_pin = require_pin;
        self
    }

    pub fn with_timing_window_minutes(mut self, minutes: i64) -> Self {
        self.timing_window_minutes = minutes.max(0);
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn enforcement_for(&self, kind: SafetyCheckKind) -> Enforcement {
        self.enforcement
            .get(&kind)
            .copied()
            .unwrap_or(Enforcement::Block)
    }

    /// Splits failed checks into (blocking, warning) messages.
    pub fn partition_failures(&self, results: &[SafetyCheckResult]) -> (Vec<String>, Vec<String>) {
        let mut blocking = Vec::new();
        let mut warnings = Vec::new();
        for result in results.iter().filter(|r| !r.passed) {
            let message = result
                .message
                .clone()
                .unwrap_or_else(|| format!("{:?} check failed", result.kind));
            match self.enforcement_for(result.kind) {
                Enforcement::Block => blocking.push(message),
                Enforcement::Warn => warnings.push(message),
            }
        }
        (blocking, warnings)
    }
}

/// Major or contraindicated interactions fail; lesser ones pass with a note.
pub fn check_drug_interactions(findings: &[InteractionFinding]) -> SafetyCheckResult {
    let kind = SafetyCheckKind::DrugInteraction;
    let blocking: Vec<String> = findings
        .iter()
        .filter(|f| f.severity >= InteractionSeverity::Major)
        .map(|f| {
            format!(
                "{:?} interaction with {}: {}",
                f.severity, f.interacting_medication_name, f.description
            )
        })
        .collect();
    if !blocking.is_empty() {
        return SafetyCheckResult::fail(kind, blocking.join("; "));
    }
    if findings.is_empty() {
        return SafetyCheckResult::pass(kind);
    }
    let notes: Vec<String> = findings
        .iter()
        .map(|f| {
            format!(
                "{:?} interaction with {}",
                f.severity, f.interacting_medication_name
            )
        })
        .collect();
    SafetyCheckResult::pass_with_note(kind, notes.join("; "))
}

pub fn check_allergies(findings: &[AllergyFinding]) -> SafetyCheckResult {
    let kind = SafetyCheckKind::Allergy;
    if findings.is_empty() {
        return SafetyCheckResult::pass(kind);
    }
    let allergens: Vec<&str> = findings.iter().map(|f| f.allergen.as_str()).collect();
    SafetyCheckResult::fail(
        kind,
        format!("Resident is allergic to {}", allergens.join(", ")),
    )
}

/// Fails when the last GIVEN dose of the same schedule is closer than the
/// minimum interval.
pub fn check_duplicate_dose(
    last_given_at: Option<DateTime<Utc>>,
    administered_at: DateTime<Utc>,
    min_interval_minutes: i64,
) -> SafetyCheckResult {
    let kind = SafetyCheckKind::DuplicateDose;
    let Some(last) = last_given_at else {
        return SafetyCheckResult::pass(kind);
    };
    let elapsed = (administered_at - last).num_minutes().abs();
    if elapsed < min_interval_minutes {
        return SafetyCheckResult::fail(
            kind,
            format!(
                "A dose was already given {} minutes ago (minimum interval {} minutes)",
                elapsed, min_interval_minutes
            ),
        );
    }
    SafetyCheckResult::pass(kind)
}

/// Passes when no maximum is configured.
pub fn check_max_daily_dose(
    given_last_24h: Decimal,
    dose: Decimal,
    max_daily_dose: Option<Decimal>,
) -> SafetyCheckResult {
    let kind = SafetyCheckKind::MaxDailyDose;
    let Some(max) = max_daily_dose else {
        return SafetyCheckResult::pass(kind);
    };
    let total = given_last_24h + dose;
    if total > max {
        return SafetyCheckResult::fail(
            kind,
            format!(
                "Dose would bring the 24 hour total to {} (maximum {})",
                total.normalize(),
                max.normalize()
            ),
        );
    }
    SafetyCheckResult::pass(kind)
}

/// Schedule times are wall-clock times in `timezone`, so the instant is
/// converted before comparing.
pub fn check_timing_window(
    scheduled_times: &[NaiveTime],
    administered_at: DateTime<Utc>,
    timezone: Tz,
    window_minutes: i64,
) -> SafetyCheckResult {
    let kind = SafetyCheckKind::TimingWindow;
    if scheduled_times.is_empty() {
        // "as required" schedules have no fixed times
        return SafetyCheckResult::pass(kind);
    }
    let at = administered_at.with_timezone(&timezone).time();
    let nearest = scheduled_times
        .iter()
        .map(|t| minutes_between_times_of_day(*t, at))
        .min()
        .unwrap_or(0);
    if nearest > window_minutes {
        return SafetyCheckResult::fail(
            kind,
            format!(
                "Administration is {} minutes from the nearest scheduled time (window {} minutes)",
                nearest, window_minutes
            ),
        );
    }
    SafetyCheckResult::pass(kind)
}

pub fn check_stock_availability(available: Option<Decimal>, dose: Decimal) -> SafetyCheckResult {
    let kind = SafetyCheckKind::StockAvailability;
    match available {
        None => SafetyCheckResult::fail(kind, "No stock record for this medication"),
        Some(quantity) if quantity < dose => SafetyCheckResult::fail(
            kind,
            format!(
                "Insufficient stock: {} on hand, {} required",
                quantity.normalize(),
                dose.normalize()
            ),
        ),
        Some(_) => SafetyCheckResult::pass(kind),
    }
}
