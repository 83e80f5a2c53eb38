use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSeverity {
    Minor,
    Moderate,
    Major,
    Contraindicated,
}

/// Known interaction between two medications. The pair is unordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugInteraction {
    pub id: String,
    pub medication_a_id: String,
    pub medication_b_id: String,
    pub severity: InteractionSeverity,
    pub description: String,
}

impl DrugInteraction {
    pub fn involves(&self, medication_id: &str) -> bool {
        self.medication_a_id == medication_id || self.medication_b_id == medication_id
    }

    /// The other medication of the pair, if `medication_id` is part of it.
    pub fn counterpart(&self, medication_id: &str) -> Option<&str> {
        if self.medication_a_id == medication_id {
            Some(&self.medication_b_id)
        } else if self.medication_b_id == medication_id {
            Some(&self.medication_a_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDrugInteraction {
    pub medication_a_id: String,
    pub medication_b_id: String,
    pub severity: InteractionSeverity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionFinding {
    pub interacting_medication_id: String,
    pub interacting_medication_name: String,
    pub severity: InteractionSeverity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyFinding {
    pub allergen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContraindicationFinding {
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosageValidation {
    pub valid: bool,
    pub proposed_dose: Decimal,
    pub given_last_24h: Decimal,
    pub max_daily_dose: Option<Decimal>,
    /// Remaining allowance in the trailing 24 hours, if a maximum is set.
    pub remaining_allowance: Option<Decimal>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyAssessment {
    Safe,
    CautionRecommended,
    HighRisk,
    Contraindicated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalSafetyReport {
    pub resident_id: String,
    pub medication_id: String,
    pub assessment: SafetyAssessment,
    pub interactions: Vec<InteractionFinding>,
    pub allergies: Vec<AllergyFinding>,
    pub contraindications: Vec<ContraindicationFinding>,
    pub dosage: DosageValidation,
    pub recommendations: Vec<String>,
}
