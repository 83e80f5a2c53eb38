use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use carehome_core::sync::SyncQueueItem;
use carehome_core::utils::time_utils::{parse_db_timestamp, to_db_timestamp};
use carehome_core::Result;

use crate::utils::{enum_from_db, enum_to_db, json_from_db, json_to_db};

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
#[diesel(table_name = crate::schema::sync_queue)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SyncQueueItemDB {
    pub id: String,
    pub item_type: String,
    pub payload: String,
    pub retry_count: i32,
    pub status: String,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SyncQueueItemDB {
    pub fn from_domain(item: &SyncQueueItem) -> Result<Self> {
        Ok(Self {
            id: item.id.clone(),
            item_type: enum_to_db(&item.item_type)?,
            payload: json_to_db(&item.payload)?,
            retry_count: item.retry_count,
            status: enum_to_db(&item.status)?,
            last_error: item.last_error.clone(),
            created_at: to_db_timestamp(&item.created_at),
            updated_at: to_db_timestamp(&item.updated_at),
        })
    }

    pub fn into_domain(self) -> Result<SyncQueueItem> {
        Ok(SyncQueueItem {
            id: self.id,
            item_type: enum_from_db(&self.item_type)?,
            payload: json_from_db(&self.payload)?,
            retry_count: self.retry_count,
            status: enum_from_db(&self.status)?,
            last_error: self.last_error,
            created_at: parse_db_timestamp(&self.created_at)?,
            updated_at: parse_db_timestamp(&self.updated_at)?,
        })
    }
}
