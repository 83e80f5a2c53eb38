use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::residents::Resident;
use carehome_core::utils::time_utils::{parse_db_timestamp, to_db_timestamp};
use carehome_core::Result;

use crate::utils::{json_from_db, json_to_db};

#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Debug,
    Clone,
    Serialize,
    Deserialize,
)]
#[diesel(table_name = crate::schema::residents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResidentDB {
    pub id: String,
    pub care_home_id: String,
    pub name: String,
    pub allergies: String,
    pub conditions: String,
    pub created_at: String,
    pub updated_at: String,
}

impl ResidentDB {
    pub fn from_domain(resident: &Resident) -> Result<Self> {
        Ok(Self {
            id: resident.id.clone(),
            care_home_id: resident.care_home_id.clone(),
            name: resident.name.clone(),
            allergies: json_to_db(&resident.allergies)?,
            conditions: json_to_db(&resident.conditions)?,
            created_at: to_db_timestamp(&resident.created_at),
            updated_at: to_db_timestamp(&resident.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<Resident> {
        Ok(Resident {
            id: self.id,
            care_home_id: self.care_home_id,
            name: self.name,
            allergies: json_from_db(&self.allergies)?,
            conditions: json_from_db(&self.conditions)?,
            created_at: parse_db_timestamp(&self.created_at)?,
            updated_at: parse_db_timestamp(&self.updated_at)?,
        })
    }
}
