//! Inspection and manual control of the offline sync queue.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use carehome_core::sync::{
    OfflineSyncServiceTrait, SyncPassResult, SyncQueueItem, SyncQueueStats,
};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueueResponse {
    stats: SyncQueueStats,
    items: Vec<SyncQueueItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetryResponse {
    requeued: usize,
}

async fn get_queue(State(state): State<Arc<AppState>>) -> ApiResult<Json<QueueResponse>> {
    let sync = &state.context.sync_service;
    Ok(Json(QueueResponse {
        stats: sync.get_stats()?,
        items: sync.list_items()?,
    }))
}

async fn process_queue(State(state): State<Arc<AppState>>) -> ApiResult<Json<SyncPassResult>> {
    if !state.context.sync_configured {
        return Err(ApiError::Unavailable(
            "Sync server is not configured".to_string(),
        ));
    }
    Ok(Json(state.context.sync_service.process_queue().await?))
}

async fn retry_failed(State(state): State<Arc<AppState>>) -> ApiResult<Json<RetryResponse>> {
    let requeued = state.context.sync_service.retry_failed_items().await?;
    info!("Requeued {} failed sync items", requeued);
    Ok(Json(RetryResponse { requeued }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sync/queue", get(get_queue))
        .route("/sync/queue/process", post(process_queue))
        .route("/sync/queue/retry-failed", post(retry_failed))
}
