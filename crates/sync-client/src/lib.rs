//! HTTP transport that pushes offline sync queue items to the central
//! care-home server.

mod client;
mod crypto;
mod error;
mod types;

pub use client::SyncApiClient;
pub use crypto::{is_valid_sha256_checksum, sha256_checksum};
pub use error::{Result, SyncClientError};
pub use types::{ApiErrorResponse, SyncItemEnvelope, SyncPushResponse};
