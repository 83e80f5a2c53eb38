use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    pub id: String,
    pub care_home_id: String,
    pub name: String,
    /// Allergen class names, e.g. "penicillins".
    pub allergies: Vec<String>,
    /// Active conditions used for contraindication checks.
    pub conditions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resident {
    pub fn has_allergy(&self, allergen: &str) -> bool {
        self.allergies
            .iter()
            .any(|a| a.trim().eq_ignore_ascii_case(allergen.trim()))
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.conditions
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(condition.trim()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResident {
    pub id: Option<String>,
    pub care_home_id: String,
    pub name: String,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
}
