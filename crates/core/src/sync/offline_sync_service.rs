//! Serial push of queued records with a fixed retry budget.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::{Mutex, Notify};

use super::{
    NewSyncQueueItem, SyncItemType, SyncPassResult, SyncQueueItem, SyncQueueRepositoryTrait,
    SyncQueueStats, SyncTransport, MAX_SYNC_RETRIES,
};
use crate::errors::{Result, SyncError};
use crate::events::{DomainEvent, DomainEventSink, NoOpDomainEventSink};

#[async_trait]
pub trait OfflineSyncServiceTrait: Send + Sync {
    /// Persists an item and wakes the sync worker. Does not wait for the push.
    async fn enqueue(
        &self,
        item_type: SyncItemType,
        payload: serde_json::Value,
    ) -> Result<SyncQueueItem>;

    /// Wakes the sync worker after items were queued by another writer.
    fn notify_enqueued(&self);

    /// One serial pass over every processable item.
    async fn process_queue(&self) -> Result<SyncPassResult>;

    /// Zeroes retry counters of FAILED items, requeues them as PENDING and
    /// wakes the worker.
    async fn retry_failed_items(&self) -> Result<usize>;

    async fn recover_in_progress(&self) -> Result<usize>;

    fn get_stats(&self) -> Result<SyncQueueStats>;

    fn list_items(&self) -> Result<Vec<SyncQueueItem>>;
}

pub struct OfflineSyncService {
    repository: Arc<dyn SyncQueueRepositoryTrait>,
    transport: Arc<dyn SyncTransport>,
    event_sink: Arc<dyn DomainEventSink>,
    pass_guard: Mutex<()>,
    wake: Arc<Notify>,
    max_retries: i32,
}

impl OfflineSyncService {
    pub fn new(
        repository: Arc<dyn SyncQueueRepositoryTrait>,
        transport: Arc<dyn SyncTransport>,
    ) -> Self {
        Self {
            repository,
            transport,
            event_sink: Arc::new(NoOpDomainEventSink),
            pass_guard: Mutex::new(()),
            wake: Arc::new(Notify::new()),
            max_retries: MAX_SYNC_RETRIES,
        }
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn DomainEventSink>) -> Self {
        self.event_sink = event_sink;
        self
    }

    /// Handle the background worker waits on.
    pub fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    async fn push_one(&self, item: &SyncQueueItem) -> std::result::Result<(), String> {
        match self.transport.push(item).await {
            Ok(ack) if ack.acknowledges(&item.id) => Ok(()),
            Ok(_) => Err(SyncError::NotAcknowledged(item.id.clone()).to_string()),
            Err(err) => Err(err.to_string()),
        }
    }
}

#[async_trait]
impl OfflineSyncServiceTrait for OfflineSyncService {
    async fn enqueue(
        &self,
        item_type: SyncItemType,
        payload: serde_json::Value,
    ) -> Result<SyncQueueItem> {
        let item = self
            .repository
            .enqueue(NewSyncQueueItem::new(item_type, payload))
            .await?;
        debug!("Queued {:?} item {}", item.item_type, item.id);
        self.notify_enqueued();
        Ok(item)
    }

    fn notify_enqueued(&self) {
        self.wake.notify_one();
    }

    async fn process_queue(&self) -> Result<SyncPassResult> {
        let Ok(_guard) = self.pass_guard.try_lock() else {
            debug!("Sync pass already running; skipping");
            return Ok(SyncPassResult {
                already_running: true,
                ..SyncPassResult::default()
            });
        };
        let started_at = Instant::now();

        let items = self.repository.list_processable(self.max_retries)?;
        let skipped_exhausted = self.repository.get_stats(self.max_retries)?.exhausted_items;
        let mut result = SyncPassResult {
            skipped_exhausted,
            ..SyncPassResult::default()
        };

        for item in items {
            result.attempted += 1;
            self.repository.mark_in_progress(&item.id).await?;

            match self.push_one(&item).await {
                Ok(()) => {
                    self.repository.remove_item(&item.id).await?;
                    result.synced += 1;
                    self.event_sink.emit(DomainEvent::SyncItemSynced {
                        item_id: item.id.clone(),
                        item_type: item.item_type,
                    });
                }
                Err(message) => {
                    let updated = self
                        .repository
                        .mark_failed(&item.id, message.clone())
                        .await?;
                    let exhausted = updated.retry_count >= self.max_retries;
                    result.failed += 1;
                    warn!(
                        "Sync of {:?} item {} failed (attempt {}/{}): {}",
                        item.item_type, item.id, updated.retry_count, self.max_retries, message
                    );
                    self.event_sink.emit(DomainEvent::SyncItemFailed {
                        item_id: item.id.clone(),
                        item_type: item.item_type,
                        retry_count: updated.retry_count,
                        error: message,
                        exhausted,
                    });
                }
            }
        }

        result.duration_ms = started_at.elapsed().as_millis() as i64;
        if result.attempted > 0 {
            info!(
                "Sync pass finished: {} synced, {} failed, {} awaiting manual retry",
                result.synced, result.failed, result.skipped_exhausted
            );
        }
        self.event_sink.emit(DomainEvent::SyncPassCompleted {
            result: result.clone(),
        });
        Ok(result)
    }

    async fn retry_failed_items(&self) -> Result<usize> {
        let reset = self.repository.reset_failed().await?;
        info!("Requeued {} failed sync items", reset);
        if reset > 0 {
            self.notify_enqueued();
        }
        Ok(reset)
    }

    async fn recover_in_progress(&self) -> Result<usize> {
        // a running pass owns its IN_PROGRESS items
        let _guard = self.pass_guard.lock().await;
        let recovered = self.repository.recover_in_progress().await?;
        if recovered > 0 {
            warn!(
                "Recovered {} sync items left in progress by an interrupted pass",
                recovered
            );
            self.notify_enqueued();
        }
        Ok(recovered)
    }

    fn get_stats(&self) -> Result<SyncQueueStats> {
        self.repository.get_stats(self.max_retries)
    }

    fn list_items(&self) -> Result<Vec<SyncQueueItem>> {
        self.repository.list_items()
    }
}
