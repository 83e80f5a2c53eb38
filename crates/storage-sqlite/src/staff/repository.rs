use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;

use carehome_core::security::StaffCredentialRepositoryTrait;
use carehome_core::utils::time_utils::to_db_timestamp;
use carehome_core::Result;

use super::model::StaffCredentialDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::staff_credentials;

pub struct StaffCredentialRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl StaffCredentialRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        StaffCredentialRepository { pool, writer }
    }
}

#[async_trait]
impl StaffCredentialRepositoryTrait for StaffCredentialRepository {
    fn get_pin_hash(&self, staff_id: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(staff_credentials::table
            .find(staff_id)
            .select(staff_credentials::pin_hash)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?)
    }

    async fn set_pin_hash(&self, staff_id: &str, pin_hash: String) -> Result<()> {
        let row = StaffCredentialDB {
            staff_id: staff_id.to_string(),
            pin_hash,
            updated_at: to_db_timestamp(&Utc::now()),
        };
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(staff_credentials::table)
                    .values(&row)
                    .on_conflict(staff_credentials::staff_id)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
