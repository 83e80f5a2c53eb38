use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;
use uuid::Uuid;

use carehome_core::errors::{Error, MedicationError, MedicationErrorCode};
use carehome_core::medications::{
    AdministrationStatus, Medication, MedicationAdministration, MedicationRepositoryTrait,
    MedicationSchedule, NewMedication, NewMedicationAdministration, NewMedicationSchedule,
    ScheduleStatus, DEFAULT_MIN_DOSE_INTERVAL_MINUTES,
};
use carehome_core::utils::time_utils::to_db_timestamp;
use carehome_core::Result;

use super::model::{MedicationAdministrationDB, MedicationDB, MedicationScheduleDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::{medication_administrations, medication_schedules, medications};
use crate::utils::{decimal_from_db, decimal_to_db, enum_to_db};

pub struct MedicationRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl MedicationRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        MedicationRepository { pool, writer }
    }
}

/// Loads an unsigned record for modification inside a write transaction.
fn load_unsigned(
    conn: &mut SqliteConnection,
    record_id: &str,
) -> Result<MedicationAdministrationDB> {
    let row = medication_administrations::table
        .find(record_id)
        .first::<MedicationAdministrationDB>(conn)
        .optional()
        .map_err(StorageError::from)?
        .ok_or_else(|| Error::not_found(format!("administration record {}", record_id)))?;
    if row.signed_at.is_some() {
        return Err(MedicationError::new(
            MedicationErrorCode::RecordSigned,
            format!("Administration record {} is signed and cannot change", record_id),
        )
        .into());
    }
    Ok(row)
}

#[async_trait]
impl MedicationRepositoryTrait for MedicationRepository {
    fn get_medication(&self, medication_id: &str) -> Result<Option<Medication>> {
        let mut conn = get_connection(&self.pool)?;
        medications::table
            .find(medication_id)
            .first::<MedicationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(MedicationDB::into_domain)
            .transpose()
    }

    fn get_schedule(&self, schedule_id: &str) -> Result<Option<MedicationSchedule>> {
        let mut conn = get_connection(&self.pool)?;
        medication_schedules::table
            .find(schedule_id)
            .first::<MedicationScheduleDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(MedicationScheduleDB::into_domain)
            .transpose()
    }

    fn list_active_schedules_for_resident(
        &self,
        resident_id: &str,
    ) -> Result<Vec<MedicationSchedule>> {
        let mut conn = get_connection(&self.pool)?;
        let active = enum_to_db(&ScheduleStatus::Active)?;
        medication_schedules::table
            .filter(medication_schedules::resident_id.eq(resident_id))
            .filter(medication_schedules::status.eq(active))
            .order((
                medication_schedules::created_at.asc(),
                medication_schedules::id.asc(),
            ))
            .load::<MedicationScheduleDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(MedicationScheduleDB::into_domain)
            .collect()
    }

    fn get_administration(&self, record_id: &str) -> Result<Option<MedicationAdministration>> {
        let mut conn = get_connection(&self.pool)?;
        medication_administrations::table
            .find(record_id)
            .first::<MedicationAdministrationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(MedicationAdministrationDB::into_domain)
            .transpose()
    }

    fn list_administrations_for_resident(
        &self,
        resident_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<MedicationAdministration>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = medication_administrations::table
            .filter(medication_administrations::resident_id.eq(resident_id))
            .into_boxed();
        if let Some(since) = since {
            query = query
                .filter(medication_administrations::administered_at.ge(to_db_timestamp(&since)));
        }
        query
            .order(medication_administrations::administered_at.desc())
            .load::<MedicationAdministrationDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(MedicationAdministrationDB::into_domain)
            .collect()
    }

    fn last_given_for_schedule(
        &self,
        schedule_id: &str,
    ) -> Result<Option<MedicationAdministration>> {
        let mut conn = get_connection(&self.pool)?;
        let given = enum_to_db(&AdministrationStatus::Given)?;
        medication_administrations::table
            .filter(medication_administrations::schedule_id.eq(schedule_id))
            .filter(medication_administrations::status.eq(given))
            .order(medication_administrations::administered_at.desc())
            .first::<MedicationAdministrationDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(MedicationAdministrationDB::into_domain)
            .transpose()
    }

    fn total_given_since(
        &self,
        resident_id: &str,
        medication_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Decimal> {
        let mut conn = get_connection(&self.pool)?;
        let given = enum_to_db(&AdministrationStatus::Given)?;
        let doses = medication_administrations::table
            .filter(medication_administrations::resident_id.eq(resident_id))
            .filter(medication_administrations::medication_id.eq(medication_id))
            .filter(medication_administrations::status.eq(given))
            .filter(medication_administrations::administered_at.ge(to_db_timestamp(&since)))
            .select(medication_administrations::dose)
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        doses
            .iter()
            .try_fold(Decimal::ZERO, |total, dose| Ok(total + decimal_from_db(dose)?))
    }

    async fn insert_medication(&self, new_medication: NewMedication) -> Result<Medication> {
        let medication = Medication {
            id: new_medication
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            name: new_medication.name,
            strength: new_medication.strength,
            form: new_medication.form,
            allergen_classes: new_medication.allergen_classes,
            contraindications: new_medication.contraindications,
            max_daily_dose: new_medication.max_daily_dose,
            min_interval_minutes: new_medication
                .min_interval_minutes
                .unwrap_or(DEFAULT_MIN_DOSE_INTERVAL_MINUTES),
            is_controlled: new_medication.is_controlled,
        };
        let row = MedicationDB::from_domain(&medication)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Medication> {
                diesel::insert_into(medications::table)
                    .values(&row)
                    .returning(MedicationDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }

    async fn insert_schedule(
        &self,
        new_schedule: NewMedicationSchedule,
    ) -> Result<MedicationSchedule> {
        let now = Utc::now();
        let schedule = MedicationSchedule {
            id: new_schedule
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            resident_id: new_schedule.resident_id,
            medication_id: new_schedule.medication_id,
            times: new_schedule.times,
            frequency: new_schedule.frequency,
            dose: new_schedule.dose,
            unit: new_schedule.unit,
            status: ScheduleStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let row = MedicationScheduleDB::from_domain(&schedule)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<MedicationSchedule> {
                diesel::insert_into(medication_schedules::table)
                    .values(&row)
                    .returning(MedicationScheduleDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }

    async fn update_schedule_status(
        &self,
        schedule_id: &str,
        status: ScheduleStatus,
    ) -> Result<MedicationSchedule> {
        let schedule_id = schedule_id.to_string();
        let status = enum_to_db(&status)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<MedicationSchedule> {
                diesel::update(medication_schedules::table.find(&schedule_id))
                    .set((
                        medication_schedules::status.eq(status),
                        medication_schedules::updated_at.eq(to_db_timestamp(&Utc::now())),
                    ))
                    .returning(MedicationScheduleDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found(format!("schedule {}", schedule_id)))?
                    .into_domain()
            })
            .await
    }

    async fn insert_administration(
        &self,
        record: NewMedicationAdministration,
    ) -> Result<MedicationAdministration> {
        let row = MedicationAdministrationDB {
            id: Uuid::now_v7().to_string(),
            schedule_id: record.schedule_id,
            resident_id: record.resident_id,
            medication_id: record.medication_id,
            status: enum_to_db(&record.status)?,
            dose: decimal_to_db(record.dose),
            administered_by: record.administered_by,
            witnessed_by: record.witnessed_by,
            administered_at: to_db_timestamp(&record.administered_at),
            notes: record.notes,
            signed_by: None,
            signed_at: None,
            created_at: to_db_timestamp(&Utc::now()),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<MedicationAdministration> {
                diesel::insert_into(medication_administrations::table)
                    .values(&row)
                    .returning(MedicationAdministrationDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }

    async fn sign_administration(
        &self,
        record_id: &str,
        signed_by: &str,
        signed_at: DateTime<Utc>,
    ) -> Result<MedicationAdministration> {
        let record_id = record_id.to_string();
        let signed_by = signed_by.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<MedicationAdministration> {
                load_unsigned(conn, &record_id)?;
                diesel::update(medication_administrations::table.find(&record_id))
                    .set((
                        medication_administrations::signed_by.eq(Some(signed_by)),
                        medication_administrations::signed_at
                            .eq(Some(to_db_timestamp(&signed_at))),
                    ))
                    .returning(MedicationAdministrationDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }

    async fn update_administration_notes(
        &self,
        record_id: &str,
        notes: Option<String>,
    ) -> Result<MedicationAdministration> {
        let record_id = record_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<MedicationAdministration> {
                load_unsigned(conn, &record_id)?;
                diesel::update(medication_administrations::table.find(&record_id))
                    .set(medication_administrations::notes.eq(notes))
                    .returning(MedicationAdministrationDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations, spawn_writer};
    use crate::residents::ResidentRepository;
    use carehome_core::residents::{NewResident, ResidentRepositoryTrait};
    use chrono::{Duration, NaiveTime, TimeZone};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    async fn setup() -> MedicationRepository {
        let dir = tempdir().expect("tempdir").keep();
        let db_path = init(&dir.to_string_lossy()).expect("init db");
        run_migrations(&db_path).expect("migrate db");
        let pool = create_pool(&db_path).expect("create pool");
        let writer = spawn_writer(pool.as_ref().clone());

        ResidentRepository::new(pool.clone(), writer.clone())
            .insert_resident(NewResident {
                id: Some("res-1".to_string()),
                care_home_id: "home-1".to_string(),
                name: "Edith".to_string(),
                allergies: vec![],
                conditions: vec![],
            })
            .await
            .expect("resident");

        let repo = MedicationRepository::new(pool, writer);
        repo.insert_medication(NewMedication {
            id: Some("med-para".to_string()),
            name: "Paracetamol".to_string(),
            strength: Some("500mg".to_string()),
            form: Some("tablet".to_string()),
            allergen_classes: vec![],
            contraindications: vec![],
            max_daily_dose: Some(dec!(4000)),
            min_interval_minutes: None,
            is_controlled: false,
        })
        .await
        .expect("medication");
        repo.insert_schedule(NewMedicationSchedule {
            id: Some("sch-1".to_string()),
            resident_id: "res-1".to_string(),
            medication_id: "med-para".to_string(),
            times: vec![
                NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            ],
            frequency: "twice daily".to_string(),
            dose: dec!(1000),
            unit: "mg".to_string(),
        })
        .await
        .expect("schedule");
        repo
    }

    fn given(at: DateTime<Utc>, dose: Decimal) -> NewMedicationAdministration {
        NewMedicationAdministration {
            schedule_id: "sch-1".to_string(),
            resident_id: "res-1".to_string(),
            medication_id: "med-para".to_string(),
            status: AdministrationStatus::Given,
            dose,
            administered_by: "nurse-1".to_string(),
            witnessed_by: None,
            administered_at: at,
            notes: None,
        }
    }

    #[tokio::test]
    async fn medication_and_schedule_round_trip() {
        let repo = setup().await;
        let medication = repo.get_medication("med-para").unwrap().expect("found");
        assert_eq!(medication.max_daily_dose, Some(dec!(4000)));
        assert_eq!(medication.min_interval_minutes, DEFAULT_MIN_DOSE_INTERVAL_MINUTES);

        let schedule = repo.get_schedule("sch-1").unwrap().expect("found");
        assert_eq!(schedule.times[0], NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(schedule.status, ScheduleStatus::Active);
        assert_eq!(repo.list_active_schedules_for_resident("res-1").unwrap().len(), 1);

        repo.update_schedule_status("sch-1", ScheduleStatus::Suspended)
            .await
            .expect("suspend");
        assert!(repo.list_active_schedules_for_resident("res-1").unwrap().is_empty());
        assert!(repo
            .update_schedule_status("missing", ScheduleStatus::Active)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn dose_history_queries() {
        let repo = setup().await;
        let noon = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap();
        repo.insert_administration(given(noon - Duration::hours(30), dec!(1000)))
            .await
            .unwrap();
        repo.insert_administration(given(noon - Duration::hours(4), dec!(500)))
            .await
            .unwrap();
        let mut refused = given(noon - Duration::hours(1), dec!(1000));
        refused.status = AdministrationStatus::Refused;
        repo.insert_administration(refused).await.unwrap();

        let total = repo
            .total_given_since("res-1", "med-para", noon - Duration::hours(24))
            .unwrap();
        assert_eq!(total, dec!(500));

        let last = repo.last_given_for_schedule("sch-1").unwrap().expect("last");
        assert_eq!(last.administered_at, noon - Duration::hours(4));

        let all = repo.list_administrations_for_resident("res-1", None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].status, AdministrationStatus::Refused);
        let recent = repo
            .list_administrations_for_resident("res-1", Some(noon - Duration::hours(5)))
            .unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn signed_record_rejects_changes() {
        let repo = setup().await;
        let record = repo
            .insert_administration(given(Utc::now(), dec!(1000)))
            .await
            .unwrap();

        let noted = repo
            .update_administration_notes(&record.id, Some("With water".to_string()))
            .await
            .expect("notes");
        assert_eq!(noted.notes.as_deref(), Some("With water"));

        let signed = repo
            .sign_administration(&record.id, "nurse-2", Utc::now())
            .await
            .expect("sign");
        assert_eq!(signed.signed_by.as_deref(), Some("nurse-2"));

        let err = repo
            .sign_administration(&record.id, "nurse-3", Utc::now())
            .await
            .expect_err("already signed");
        assert_eq!(err.medication_code(), Some(MedicationErrorCode::RecordSigned));
        let err = repo
            .update_administration_notes(&record.id, None)
            .await
            .expect_err("already signed");
        assert_eq!(err.medication_code(), Some(MedicationErrorCode::RecordSigned));
    }
}
