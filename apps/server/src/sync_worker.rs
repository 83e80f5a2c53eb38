//! Background task that drains the offline sync queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use carehome_core::sync::{OfflineSyncService, OfflineSyncServiceTrait};

/// Runs a pass whenever something is enqueued and otherwise every
/// `interval_secs`. Items left IN_PROGRESS by a previous run are recovered
/// first.
pub fn spawn_sync_worker(sync_service: Arc<OfflineSyncService>, interval_secs: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        match sync_service.recover_in_progress().await {
            Ok(0) => {}
            Ok(n) => info!("Recovered {} interrupted sync items", n),
            Err(e) => warn!("Failed to recover interrupted sync items: {}", e),
        }

        let wake = sync_service.wake_handle();
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            tokio::select! {
                _ = wake.notified() => debug!("Sync worker woken by enqueue"),
                _ = ticker.tick() => {}
            }
            match sync_service.process_queue().await {
                Ok(result) if result.already_running => debug!("Sync pass already running"),
                Ok(_) => {}
                Err(e) => warn!("Sync pass failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carehome_core::sync::{
        NewSyncQueueItem, SyncAcknowledgement, SyncItemType, SyncQueueItem,
        SyncQueueRepositoryTrait, SyncTransport,
    };
    use carehome_storage_sqlite::{create_pool, init, run_migrations, spawn_writer, SyncQueueRepository};
    use tempfile::tempdir;

    struct AckAll;

    #[async_trait]
    impl SyncTransport for AckAll {
        async fn push(&self, item: &SyncQueueItem) -> carehome_core::Result<SyncAcknowledgement> {
            Ok(SyncAcknowledgement {
                acknowledged_ids: vec![item.id.clone()],
            })
        }
    }

    #[tokio::test]
    async fn enqueue_wakes_worker_and_drains_queue() {
        let dir = tempdir().expect("tempdir").keep();
        let db_path = init(&dir.to_string_lossy()).expect("init db");
        run_migrations(&db_path).expect("migrate");
        let pool = create_pool(&db_path).expect("pool");
        let queue = Arc::new(SyncQueueRepository::new(
            pool.clone(),
            spawn_writer(pool.as_ref().clone()),
        ));
        queue
            .enqueue(NewSyncQueueItem::new(SyncItemType::Consent, serde_json::json!({})))
            .await
            .unwrap();
        queue.mark_in_progress(&queue.list_items().unwrap()[0].id).await.unwrap();

        let service = Arc::new(OfflineSyncService::new(queue.clone(), Arc::new(AckAll)));
        let worker = spawn_sync_worker(service.clone(), 3600);

        service
            .enqueue(SyncItemType::Signature, serde_json::json!({}))
            .await
            .unwrap();
        service.notify_enqueued();

        let mut drained = false;
        for _ in 0..50 {
            if queue.list_items().unwrap().is_empty() {
                drained = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        worker.abort();
        assert!(drained, "worker should push the recovered and the new item");
    }
}
