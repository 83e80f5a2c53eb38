use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::clinical::DrugInteraction;
use carehome_core::Result;

use crate::utils::{enum_from_db, enum_to_db};

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::drug_interactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DrugInteractionDB {
    pub id: String,
    pub medication_a_id: String,
    pub medication_b_id: String,
    pub severity: String,
    pub description: String,
}

impl DrugInteractionDB {
    pub fn from_domain(interaction: &DrugInteraction) -> Result<Self> {
        Ok(Self {
            id: interaction.id.clone(),
            medication_a_id: interaction.medication_a_id.clone(),
            medication_b_id: interaction.medication_b_id.clone(),
            severity: enum_to_db(&interaction.severity)?,
            description: interaction.description.clone(),
        })
    }

    pub fn into_domain(self) -> Result<DrugInteraction> {
        Ok(DrugInteraction {
            id: self.id,
            medication_a_id: self.medication_a_id,
            medication_b_id: self.medication_b_id,
            severity: enum_from_db(&self.severity)?,
            description: self.description,
        })
    }
}
