//! Residents, the interaction catalogue and on-demand clinical checks.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use carehome_core::clinical::{ClinicalSafetyReport, DrugInteraction, NewDrugInteraction};
use carehome_core::residents::{NewResident, Resident};

use crate::error::{ApiError, ApiResult};
use crate::main_lib::AppState;

async fn create_resident(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewResident>,
) -> ApiResult<(StatusCode, Json<Resident>)> {
    if body.name.trim().is_empty() {
        return Err(ApiError::Validation("Resident name is required".to_string()));
    }
    let resident = state.context.resident_repository.insert_resident(body).await?;
    info!("Registered resident {}", resident.id);
    Ok((StatusCode::CREATED, Json(resident)))
}

async fn get_resident(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Resident>> {
    state
        .context
        .resident_repository
        .get_resident(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("resident {}", id)))
}

#[derive(Debug, Deserialize)]
struct SafetyQuery {
    dose: String,
    at: Option<DateTime<Utc>>,
}

async fn safety_check(
    Path((id, medication_id)): Path<(String, String)>,
    Query(query): Query<SafetyQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ClinicalSafetyReport>> {
    let dose = Decimal::from_str(query.dose.trim())
        .map_err(|_| ApiError::Validation(format!("Invalid dose: {}", query.dose)))?;
    let report = state
        .context
        .clinical_service
        .perform_safety_check(&id, &medication_id, dose, query.at.unwrap_or_else(Utc::now))
        .await?;
    Ok(Json(report))
}

async fn create_interaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewDrugInteraction>,
) -> ApiResult<(StatusCode, Json<DrugInteraction>)> {
    let interaction = state
        .context
        .interaction_repository
        .insert_interaction(body)
        .await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/residents", post(create_resident))
        .route("/residents/:id", get(get_resident))
        .route("/residents/:id/safety/:medication_id", get(safety_check))
        .route("/interactions", post(create_interaction))
}
