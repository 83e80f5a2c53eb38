use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use uuid::Uuid;

use carehome_core::residents::{NewResident, Resident, ResidentRepositoryTrait};
use carehome_core::Result;

use super::model::ResidentDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::residents;

pub struct ResidentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ResidentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ResidentRepository { pool, writer }
    }
}

#[async_trait]
impl ResidentRepositoryTrait for ResidentRepository {
    fn get_resident(&self, resident_id: &str) -> Result<Option<Resident>> {
        let mut conn = get_connection(&self.pool)?;
        residents::table
            .find(resident_id)
            .first::<ResidentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(ResidentDB::into_domain)
            .transpose()
    }

    async fn insert_resident(&self, new_resident: NewResident) -> Result<Resident> {
        let now = Utc::now();
        let resident = Resident {
            id: new_resident
                .id
                .unwrap_or_else(|| Uuid::now_v7().to_string()),
            care_home_id: new_resident.care_home_id,
            name: new_resident.name,
            allergies: new_resident.allergies,
            conditions: new_resident.conditions,
            created_at: now,
            updated_at: now,
        };
        let row = ResidentDB::from_domain(&resident)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Resident> {
                diesel::insert_into(residents::table)
                    .values(&row)
                    .returning(ResidentDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }

    async fn update_resident(&self, mut resident: Resident) -> Result<Resident> {
        resident.updated_at = Utc::now();
        let row = ResidentDB::from_domain(&resident)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Resident> {
                diesel::update(residents::table.find(row.id.clone()))
                    .set(&row)
                    .returning(ResidentDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?
                    .into_domain()
            })
            .await
    }
}
