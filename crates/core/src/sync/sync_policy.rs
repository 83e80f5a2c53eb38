//! Retry policy and scheduling constants for the offline sync queue.

use serde::{Deserialize, Serialize};

/// Attempts per item before it needs a manual retry.
pub const MAX_SYNC_RETRIES: i32 = 3;

/// Background pass cadence when nothing is enqueued.
pub const SYNC_WORKER_INTERVAL_SECS: u64 = 60;

/// Retry policy classification for transport failures.
///
/// The queue retries every failure up to [`MAX_SYNC_RETRIES`]; the class is
/// kept for logging and for callers that surface the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Classify HTTP status into retry behavior.
pub fn classify_http_status(status: u16) -> SyncRetryClass {
    match status {
        401 | 403 => SyncRetryClass::ReauthRequired,
        408 | 409 | 423 | 425 | 429 => SyncRetryClass::Retryable,
        500..=599 => SyncRetryClass::Retryable,
        _ => SyncRetryClass::Permanent,
    }
}
