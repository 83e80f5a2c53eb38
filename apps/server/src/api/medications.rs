//! Medications, schedules and the MAR itself.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use carehome_core::medications::{
    AdministrationOutcome, AdministrationRequest, Medication, MedicationAdministration,
    MedicationSchedule, NewMedication, NewMedicationSchedule, ScheduleConflict,
};

use crate::error::ApiResult;
use crate::main_lib::AppState;

async fn create_medication(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewMedication>,
) -> ApiResult<(StatusCode, Json<Medication>)> {
    let medication = state.context.medication_service.create_medication(body).await?;
    Ok((StatusCode::CREATED, Json(medication)))
}

async fn get_medication(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Medication>> {
    Ok(Json(state.context.medication_service.get_medication(&id)?))
}

async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewMedicationSchedule>,
) -> ApiResult<(StatusCode, Json<MedicationSchedule>)> {
    let schedule = state.context.medication_service.create_schedule(body).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

async fn discontinue_schedule(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MedicationSchedule>> {
    Ok(Json(
        state
            .context
            .medication_service
            .discontinue_schedule(&id)
            .await?,
    ))
}

async fn record_administration(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<AdministrationRequest>,
) -> ApiResult<(StatusCode, Json<AdministrationOutcome>)> {
    let outcome = state
        .context
        .medication_service
        .record_administration(&id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    staff_id: String,
}

async fn sign_administration(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignRequest>,
) -> ApiResult<Json<MedicationAdministration>> {
    Ok(Json(
        state
            .context
            .medication_service
            .sign_administration(&id, &body.staff_id)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct NotesRequest {
    notes: Option<String>,
}

async fn amend_notes(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<NotesRequest>,
) -> ApiResult<Json<MedicationAdministration>> {
    Ok(Json(
        state
            .context
            .medication_service
            .amend_notes(&id, body.notes)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    since: Option<DateTime<Utc>>,
}

async fn list_administrations(
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MedicationAdministration>>> {
    Ok(Json(
        state
            .context
            .medication_service
            .list_administrations_for_resident(&id, query.since)?,
    ))
}

async fn schedule_conflicts(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ScheduleConflict>>> {
    Ok(Json(
        state
            .context
            .medication_service
            .detect_schedule_conflicts(&id)?,
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/medications", post(create_medication))
        .route("/medications/:id", get(get_medication))
        .route("/schedules", post(create_schedule))
        .route("/schedules/:id/discontinue", post(discontinue_schedule))
        .route("/schedules/:id/administrations", post(record_administration))
        .route("/administrations/:id/sign", post(sign_administration))
        .route("/administrations/:id/notes", patch(amend_notes))
        .route("/residents/:id/administrations", get(list_administrations))
        .route("/residents/:id/schedule-conflicts", get(schedule_conflicts))
}
