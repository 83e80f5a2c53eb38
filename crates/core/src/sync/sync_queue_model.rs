//! Sync queue domain models and transport contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Kinds of offline mutation that are queued for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncItemType {
    Consent,
    Signature,
    Withdrawal,
}

/// Queue item lifecycle. A synced item is deleted, so there is no
/// `Synced` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncItemStatus {
    Pending,
    InProgress,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueItem {
    pub id: String,
    pub item_type: SyncItemType,
    pub payload: serde_json::Value,
    pub retry_count: i32,
    pub status: SyncItemStatus,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncQueueItem {
    pub fn is_exhausted(&self, max_retries: i32) -> bool {
        self.status == SyncItemStatus::Failed && self.retry_count >= max_retries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSyncQueueItem {
    /// Generated when absent.
    pub id: Option<String>,
    pub item_type: SyncItemType,
    pub payload: serde_json::Value,
}

impl NewSyncQueueItem {
    pub fn new(item_type: SyncItemType, payload: serde_json::Value) -> Self {
        Self {
            id: None,
            item_type,
            payload,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueStats {
    pub total_items: usize,
    pub pending_items: usize,
    pub in_progress_items: usize,
    pub failed_items: usize,
    /// Failed items that reached the retry limit and wait for a manual retry.
    pub exhausted_items: usize,
}

impl SyncQueueStats {
    pub fn from_items(items: &[SyncQueueItem], max_retries: i32) -> Self {
        let mut stats = Self {
            total_items: items.len(),
            ..Self::default()
        };
        for item in items {
            match item.status {
                SyncItemStatus::Pending => stats.pending_items += 1,
                SyncItemStatus::InProgress => stats.in_progress_items += 1,
                SyncItemStatus::Failed => {
                    stats.failed_items += 1;
                    if item.retry_count >= max_retries {
                        stats.exhausted_items += 1;
                    }
                }
            }
        }
        stats
    }
}

/// Outcome of one pass over the queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPassResult {
    /// Another pass held the guard; nothing was attempted.
    pub already_running: bool,
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
    pub skipped_exhausted: usize,
    pub duration_ms: i64,
}

/// Ids the server confirmed it has durably received.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncAcknowledgement {
    pub acknowledged_ids: Vec<String>,
}

impl SyncAcknowledgement {
    pub fn acknowledges(&self, item_id: &str) -> bool {
        self.acknowledged_ids.iter().any(|id| id == item_id)
    }
}

/// Pushes one queue item to the server.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn push(&self, item: &SyncQueueItem) -> Result<SyncAcknowledgement>;
}

#[async_trait]
pub trait SyncQueueRepositoryTrait: Send + Sync {
    fn list_items(&self) -> Result<Vec<SyncQueueItem>>;

    fn get_item(&self, item_id: &str) -> Result<Option<SyncQueueItem>>;

    /// PENDING items plus FAILED items below `max_retries`, oldest first.
    fn list_processable(&self, max_retries: i32) -> Result<Vec<SyncQueueItem>>;

    fn get_stats(&self, max_retries: i32) -> Result<SyncQueueStats>;

    async fn enqueue(&self, item: NewSyncQueueItem) -> Result<SyncQueueItem>;

    async fn mark_in_progress(&self, item_id: &str) -> Result<()>;

    /// Deletes an acknowledged item.
    async fn remove_item(&self, item_id: &str) -> Result<()>;

    /// Sets FAILED, increments the retry counter and records the error.
    async fn mark_failed(&self, item_id: &str, error: String) -> Result<SyncQueueItem>;

    /// Resets every FAILED item to PENDING with a zero retry counter.
    async fn reset_failed(&self) -> Result<usize>;

    /// Resets IN_PROGRESS items left behind by an interrupted pass.
    async fn recover_in_progress(&self) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_serialization_matches_server_contract() {
        let actual = [
            SyncItemType::Consent,
            SyncItemType::Signature,
            SyncItemType::Withdrawal,
        ]
        .iter()
        .map(|t| serde_json::to_string(t).expect("serialize item type"))
        .collect::<Vec<_>>();
        assert_eq!(actual, vec!["\"CONSENT\"", "\"SIGNATURE\"", "\"WITHDRAWAL\""]);
        assert_eq!(
            serde_json::to_string(&SyncItemStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
    }

    #[test]
    fn stats_count_exhausted_separately() {
        let now = Utc::now();
        let item = |status, retry_count| SyncQueueItem {
            id: format!("{:?}-{}", status, retry_count),
            item_type: SyncItemType::Consent,
            payload: serde_json::json!({}),
            retry_count,
            status,
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        let items = vec![
            item(SyncItemStatus::Pending, 0),
            item(SyncItemStatus::Failed, 1),
            item(SyncItemStatus::Failed, 3),
            item(SyncItemStatus::InProgress, 0),
        ];
        let stats = SyncQueueStats::from_items(&items, 3);
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.pending_items, 1);
        assert_eq!(stats.failed_items, 2);
        assert_eq!(stats.exhausted_items, 1);
        assert_eq!(stats.in_progress_items, 1);
    }
}
