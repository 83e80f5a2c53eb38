//! Error types shared by every carehome crate.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Medication(#[from] MedicationError),

    #[error("{0}")]
    Signature(#[from] SignatureError),

    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error("Security error: {0}")]
    Security(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Internal database error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Failed to store signature securely")]
    StoreFailed,

    #[error("Signature not found")]
    NotFound,

    #[error("Failed to read signature: {0}")]
    Corrupted(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("transport error: {message}")]
    Transport { message: String, retryable: bool },

    #[error("server did not acknowledge item {0}")]
    NotAcknowledged(String),

    #[error("sync transport is not configured")]
    NotConfigured,
}

/// Stable error codes surfaced to callers of the medication services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MedicationErrorCode {
    SafetyCheckFailed,
    PinVerificationFailed,
    WitnessRequired,
    ScheduleNotFound,
    ScheduleInactive,
    InsufficientStock,
    RecordSigned,
    InvalidStatus,
}

impl MedicationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafetyCheckFailed => "SAFETY_CHECK_FAILED",
            Self::PinVerificationFailed => "PIN_VERIFICATION_FAILED",
            Self::WitnessRequired => "WITNESS_REQUIRED",
            Self::ScheduleNotFound => "SCHEDULE_NOT_FOUND",
            Self::ScheduleInactive => "SCHEDULE_INACTIVE",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::RecordSigned => "RECORD_SIGNED",
            Self::InvalidStatus => "INVALID_STATUS",
        }
    }
}

impl fmt::Display for MedicationErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection raised by the medication administration pipeline.
#[derive(Error, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct MedicationError {
    pub code: MedicationErrorCode,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl MedicationError {
    pub fn new(code: MedicationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Aggregates every failed safety check into one rejection.
    pub fn safety_check_failed(failures: Vec<String>) -> Self {
        Self::new(MedicationErrorCode::SafetyCheckFailed, failures.join("; "))
            .with_details(serde_json::json!({ "failures": failures }))
    }
}

impl Error {
    /// Medication error code if this is a medication rejection.
    pub fn medication_code(&self) -> Option<MedicationErrorCode> {
        match self {
            Self::Medication(err) => Some(err.code),
            _ => None,
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Database(DatabaseError::NotFound(what.into()))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::Validation(ValidationError::InvalidInput(message.into()))
    }
}
