//! HTTP error mapping. Every failure renders as
//! `{code, message, timestamp, details}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use carehome_core::errors::{
    DatabaseError, Error as CoreError, MedicationError, MedicationErrorCode, SignatureError,
    ValidationError,
};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(String),
    Medication(MedicationError),
    Signature(SignatureError),
    /// A dependency the request needs is not configured.
    Unavailable(String),
    Internal(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: String,
    message: String,
    timestamp: DateTime<Utc>,
    details: Option<serde_json::Value>,
}

fn medication_status(code: MedicationErrorCode) -> StatusCode {
    match code {
        MedicationErrorCode::ScheduleNotFound => StatusCode::NOT_FOUND,
        MedicationErrorCode::PinVerificationFailed => StatusCode::UNAUTHORIZED,
        MedicationErrorCode::SafetyCheckFailed
        | MedicationErrorCode::WitnessRequired
        | MedicationErrorCode::ScheduleInactive
        | MedicationErrorCode::InsufficientStock
        | MedicationErrorCode::RecordSigned
        | MedicationErrorCode::InvalidStatus => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Medication(e) => ApiError::Medication(e),
            CoreError::Signature(e) => ApiError::Signature(e),
            CoreError::Database(DatabaseError::NotFound(what)) => ApiError::NotFound(what),
            CoreError::Validation(ValidationError::InvalidInput(msg))
            | CoreError::Validation(ValidationError::MissingField(msg)) => {
                ApiError::Validation(msg)
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, ErrorBody) {
        let now = Utc::now();
        let body = |code: &str, message: String| ErrorBody {
            code: code.to_string(),
            message,
            timestamp: now,
            details: None,
        };
        match self {
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                body("NOT_FOUND", format!("Not found: {}", what)),
            ),
            ApiError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                body("VALIDATION_ERROR", msg),
            ),
            ApiError::Medication(e) => (
                medication_status(e.code),
                ErrorBody {
                    code: e.code.as_str().to_string(),
                    message: e.message,
                    timestamp: e.timestamp,
                    details: e.details,
                },
            ),
            ApiError::Signature(e) => {
                let (status, code) = match e {
                    SignatureError::NotFound => (StatusCode::NOT_FOUND, "SIGNATURE_NOT_FOUND"),
                    SignatureError::StoreFailed => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "SIGNATURE_STORE_FAILED")
                    }
                    SignatureError::Corrupted(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "SIGNATURE_CORRUPTED")
                    }
                };
                (status, body(code, e.to_string()))
            }
            ApiError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                body("UNAVAILABLE", msg),
            ),
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("INTERNAL_ERROR", msg),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}
