//! Error types for the sync client crate.

use thiserror::Error;

use carehome_core::errors::SyncError;
use carehome_core::sync::{classify_http_status, SyncRetryClass};

pub type Result<T> = std::result::Result<T, SyncClientError>;

#[derive(Debug, Error)]
pub enum SyncClientError {
    /// Connection, timeout or body transfer failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success response from the server.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

impl SyncClientError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn retry_class(&self) -> SyncRetryClass {
        match self {
            Self::Api { status, .. } => classify_http_status(*status),
            Self::Http(_) => SyncRetryClass::Retryable,
            Self::Json(_) => SyncRetryClass::Permanent,
            Self::InvalidRequest(_) => SyncRetryClass::Permanent,
            Self::Auth(_) => SyncRetryClass::ReauthRequired,
        }
    }
}

impl From<SyncClientError> for carehome_core::Error {
    fn from(err: SyncClientError) -> Self {
        let retryable = err.retry_class() == SyncRetryClass::Retryable;
        carehome_core::Error::Sync(SyncError::Transport {
            message: err.to_string(),
            retryable,
        })
    }
}
