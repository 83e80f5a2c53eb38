use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::SqliteConnection;
use log::debug;
use uuid::Uuid;

use carehome_core::errors::Error;
use carehome_core::sync::{
    NewSyncQueueItem, SyncItemStatus, SyncQueueItem, SyncQueueRepositoryTrait, SyncQueueStats,
};
use carehome_core::utils::time_utils::to_db_timestamp;
use carehome_core::Result;

use super::model::SyncQueueItemDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::sync_queue;
use crate::utils::enum_to_db;

/// Inserts a PENDING queue item on `conn`. Repositories call this inside
/// their own write job so the entity and its queue item commit together.
pub fn enqueue_sync_item(
    conn: &mut SqliteConnection,
    item: NewSyncQueueItem,
) -> Result<SyncQueueItem> {
    let now = Utc::now();
    let queued = SyncQueueItem {
        id: item.id.unwrap_or_else(|| Uuid::now_v7().to_string()),
        item_type: item.item_type,
        payload: item.payload,
        retry_count: 0,
        status: SyncItemStatus::Pending,
        last_error: None,
        created_at: now,
        updated_at: now,
    };
    let row = SyncQueueItemDB::from_domain(&queued)?;
    diesel::insert_into(sync_queue::table)
        .values(&row)
        .execute(conn)
        .map_err(StorageError::from)?;
    debug!("Queued {:?} item {}", queued.item_type, queued.id);
    Ok(queued)
}

pub struct SyncQueueRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncQueueRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SyncQueueRepository { pool, writer }
    }

    fn load_all(&self) -> Result<Vec<SyncQueueItemDB>> {
        let mut conn = get_connection(&self.pool)?;
        Ok(sync_queue::table
            .order((sync_queue::created_at.asc(), sync_queue::id.asc()))
            .load::<SyncQueueItemDB>(&mut conn)
            .map_err(StorageError::from)?)
    }
}

#[async_trait]
impl SyncQueueRepositoryTrait for SyncQueueRepository {
    fn list_items(&self) -> Result<Vec<SyncQueueItem>> {
        self.load_all()?
            .into_iter()
            .map(SyncQueueItemDB::into_domain)
            .collect()
    }

    fn get_item(&self, item_id: &str) -> Result<Option<SyncQueueItem>> {
        let mut conn = get_connection(&self.pool)?;
        sync_queue::table
            .find(item_id)
            .first::<SyncQueueItemDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SyncQueueItemDB::into_domain)
            .transpose()
    }

    fn list_processable(&self, max_retries: i32) -> Result<Vec<SyncQueueItem>> {
        let mut conn = get_connection(&self.pool)?;
        let pending = enum_to_db(&SyncItemStatus::Pending)?;
        let failed = enum_to_db(&SyncItemStatus::Failed)?;
        sync_queue::table
            .filter(
                sync_queue::status.eq(pending).or(sync_queue::status
                    .eq(failed)
                    .and(sync_queue::retry_count.lt(max_retries))),
            )
            .order((sync_queue::created_at.asc(), sync_queue::id.asc()))
            .load::<SyncQueueItemDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(SyncQueueItemDB::into_domain)
            .collect()
    }

    fn get_stats(&self, max_retries: i32) -> Result<SyncQueueStats> {
        let items = self.list_items()?;
        Ok(SyncQueueStats::from_items(&items, max_retries))
    }

    async fn enqueue(&self, item: NewSyncQueueItem) -> Result<SyncQueueItem> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SyncQueueItem> {
                enqueue_sync_item(conn, item)
            })
            .await
    }

    async fn mark_in_progress(&self, item_id: &str) -> Result<()> {
        let item_id = item_id.to_string();
        let status = enum_to_db(&SyncItemStatus::InProgress)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let updated = diesel::update(sync_queue::table.find(&item_id))
                    .set((
                        sync_queue::status.eq(status),
                        sync_queue::updated_at.eq(to_db_timestamp(&Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                if updated == 0 {
                    return Err(Error::not_found(format!("sync item {}", item_id)));
                }
                Ok(())
            })
            .await
    }

    async fn remove_item(&self, item_id: &str) -> Result<()> {
        let item_id = item_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::delete(sync_queue::table.find(&item_id))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn mark_failed(&self, item_id: &str, error: String) -> Result<SyncQueueItem> {
        let item_id = item_id.to_string();
        let status = enum_to_db(&SyncItemStatus::Failed)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SyncQueueItem> {
                diesel::update(sync_queue::table.find(&item_id))
                    .set((
                        sync_queue::status.eq(status),
                        sync_queue::retry_count.eq(sync_queue::retry_count + 1),
                        sync_queue::last_error.eq(Some(error)),
                        sync_queue::updated_at.eq(to_db_timestamp(&Utc::now())),
                    ))
                    .returning(SyncQueueItemDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?
                    .ok_or_else(|| Error::not_found(format!("sync item {}", item_id)))?
                    .into_domain()
            })
            .await
    }

    async fn reset_failed(&self) -> Result<usize> {
        let failed = enum_to_db(&SyncItemStatus::Failed)?;
        let pending = enum_to_db(&SyncItemStatus::Pending)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::update(sync_queue::table.filter(sync_queue::status.eq(failed)))
                    .set((
                        sync_queue::status.eq(pending),
                        sync_queue::retry_count.eq(0),
                        sync_queue::last_error.eq(None::<String>),
                        sync_queue::updated_at.eq(to_db_timestamp(&Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    async fn recover_in_progress(&self) -> Result<usize> {
        let in_progress = enum_to_db(&SyncItemStatus::InProgress)?;
        let pending = enum_to_db(&SyncItemStatus::Pending)?;
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(
                    diesel::update(sync_queue::table.filter(sync_queue::status.eq(in_progress)))
                        .set((
                            sync_queue::status.eq(pending),
                            sync_queue::updated_at.eq(to_db_timestamp(&Utc::now())),
                        ))
                        .execute(conn)
                        .map_err(StorageError::from)?,
                )
            })
            .await
    }
}
