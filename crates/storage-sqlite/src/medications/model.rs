use chrono::NaiveTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::medications::{Medication, MedicationAdministration, MedicationSchedule};
use carehome_core::utils::time_utils::{
    parse_db_timestamp, parse_optional_db_timestamp, to_db_timestamp,
};
use carehome_core::Result;

use crate::utils::{
    decimal_from_db, decimal_to_db, enum_from_db, enum_to_db, json_from_db, json_to_db,
};

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
#[diesel(table_name = crate::schema::medications)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MedicationDB {
    pub id: String,
    pub name: String,
    pub strength: Option<String>,
    pub form: Option<String>,
    pub allergen_classes: String,
    pub contraindications: String,
    pub max_daily_dose: Option<String>,
    pub min_interval_minutes: i32,
    pub is_controlled: bool,
}

impl MedicationDB {
    pub fn from_domain(medication: &Medication) -> Result<Self> {
        Ok(Self {
            id: medication.id.clone(),
            name: medication.name.clone(),
            strength: medication.strength.clone(),
            form: medication.form.clone(),
            allergen_classes: json_to_db(&medication.allergen_classes)?,
            contraindications: json_to_db(&medication.contraindications)?,
            max_daily_dose: medication.max_daily_dose.map(decimal_to_db),
            min_interval_minutes: medication.min_interval_minutes,
            is_controlled: medication.is_controlled,
        })
    }

    pub fn into_domain(self) -> Result<Medication> {
        Ok(Medication {
            id: self.id,
            name: self.name,
            strength: self.strength,
            form: self.form,
            allergen_classes: json_from_db(&self.allergen_classes)?,
            contraindications: json_from_db(&self.contraindications)?,
            max_daily_dose: self
                .max_daily_dose
                .as_deref()
                .map(decimal_from_db)
                .transpose()?,
            min_interval_minutes: self.min_interval_minutes,
            is_controlled: self.is_controlled,
        })
    }
}

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
#[diesel(table_name = crate::schema::medication_schedules)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MedicationScheduleDB {
    pub id: String,
    pub resident_id: String,
    pub medication_id: String,
    pub times: String,
    pub frequency: String,
    pub dose: String,
    pub unit: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl MedicationScheduleDB {
    pub fn from_domain(schedule: &MedicationSchedule) -> Result<Self> {
        Ok(Self {
            id: schedule.id.clone(),
            resident_id: schedule.resident_id.clone(),
            medication_id: schedule.medication_id.clone(),
            times: json_to_db(&schedule.times)?,
            frequency: schedule.frequency.clone(),
            dose: decimal_to_db(schedule.dose),
            unit: schedule.unit.clone(),
            status: enum_to_db(&schedule.status)?,
            created_at: to_db_timestamp(&schedule.created_at),
            updated_at: to_db_timestamp(&schedule.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<MedicationSchedule> {
        let mut times: Vec<NaiveTime> = json_from_db(&self.times)?;
        times.sort();
        Ok(MedicationSchedule {
            id: self.id,
            resident_id: self.resident_id,
            medication_id: self.medication_id,
            times,
            frequency: self.frequency,
            dose: decimal_from_db(&self.dose)?,
            unit: self.unit,
            status: enum_from_db(&self.status)?,
            created_at: parse_db_timestamp(&self.created_at)?,
            updated_at: parse_db_timestamp(&self.updated_at)?,
        })
    }
}

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
#[diesel(table_name = crate::schema::medication_administrations)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MedicationAdministrationDB {
    pub id: String,
    pub schedule_id: String,
    pub resident_id: String,
    pub medication_id: String,
    pub status: String,
    pub dose: String,
    pub administered_by: String,
    pub witnessed_by: Option<String>,
    pub administered_at: String,
    pub notes: Option<String>,
    pub signed_by: Option<String>,
    pub signed_at: Option<String>,
    pub created_at: String,
}

impl MedicationAdministrationDB {
    pub fn into_domain(self) -> Result<MedicationAdministration> {
        Ok(MedicationAdministration {
            id: self.id,
            schedule_id: self.schedule_id,
            resident_id: self.resident_id,
            medication_id: self.medication_id,
            status: enum_from_db(&self.status)?,
            dose: decimal_from_db(&self.dose)?,
            administered_by: self.administered_by,
            witnessed_by: self.witnessed_by,
            administered_at: parse_db_timestamp(&self.administered_at)?,
            notes: self.notes,
            signed_by: self.signed_by,
            signed_at: parse_optional_db_timestamp(self.signed_at.as_deref())?,
            created_at: parse_db_timestamp(&self.created_at)?,
        })
    }
}
