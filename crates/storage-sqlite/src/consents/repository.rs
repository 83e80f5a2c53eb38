use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::SqliteConnection;

use carehome_core::consents::{Consent, ConsentRepositoryTrait};
use carehome_core::errors::Error;
use carehome_core::sync::NewSyncQueueItem;
use carehome_core::Result;

use super::model::ConsentDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::consents;
use crate::sync_queue::enqueue_sync_item;

pub struct ConsentRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl ConsentRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        ConsentRepository { pool, writer }
    }
}

#[async_trait]
impl ConsentRepositoryTrait for ConsentRepository {
    fn get_consent(&self, consent_id: &str) -> Result<Option<Consent>> {
        let mut conn = get_connection(&self.pool)?;
        consents::table
            .find(consent_id)
            .first::<ConsentDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(ConsentDB::into_domain)
            .transpose()
    }

    fn list_consents_for_resident(&self, resident_id: &str) -> Result<Vec<Consent>> {
        let mut conn = get_connection(&self.pool)?;
        consents::table
            .filter(consents::resident_id.eq(resident_id))
            .order(consents::granted_at.desc())
            .load::<ConsentDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(ConsentDB::into_domain)
            .collect()
    }

    async fn insert_consent(
        &self,
        consent: Consent,
        sync_item: NewSyncQueueItem,
    ) -> Result<Consent> {
        let row = ConsentDB::from_domain(&consent)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Consent> {
                let stored = diesel::insert_into(consents::table)
                    .values(&row)
                    .returning(ConsentDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                enqueue_sync_item(conn, sync_item)?;
                stored.into_domain()
            })
            .await
    }

    async fn update_consent(
        &self,
        consent: Consent,
        sync_item: NewSyncQueueItem,
    ) -> Result<Consent> {
        let row = ConsentDB::from_domain(&consent)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Consent> {
                let stored = diesel::update(consents::table.find(row.id.clone()))
                    .set(&row)
                    .returning(ConsentDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found(format!("consent {}", row.id)))?;
                enqueue_sync_item(conn, sync_item)?;
                stored.into_domain()
            })
            .await
    }
}
