use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carehome_core::sync::{SyncItemType, SyncQueueItem};

/// Body of `POST /api/v1/sync/items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItemEnvelope {
    pub id: String,
    pub item_type: SyncItemType,
    pub payload: serde_json::Value,
    pub attempt: i32,
    pub queued_at: DateTime<Utc>,
}

impl From<&SyncQueueItem> for SyncItemEnvelope {
    fn from(item: &SyncQueueItem) -> Self {
        Self {
            id: item.id.clone(),
            item_type: item.item_type,
            payload: item.payload.clone(),
            attempt: item.retry_count + 1,
            queued_at: item.created_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPushResponse {
    #[serde(default)]
    pub acknowledged_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: String,
    pub code: String,
    pub message: String,
}
