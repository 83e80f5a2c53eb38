use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use carehome_core::consents::{Consent, ConsentWithdrawal, NewConsent};

use crate::error::ApiResult;
use crate::main_lib::AppState;

async fn record_consent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewConsent>,
) -> ApiResult<(StatusCode, Json<Consent>)> {
    let consent = state.context.consent_service.record_consent(body).await?;
    Ok((StatusCode::CREATED, Json(consent)))
}

async fn get_consent(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Consent>> {
    Ok(Json(state.context.consent_service.get_consent(&id)?))
}

async fn withdraw_consent(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ConsentWithdrawal>,
) -> ApiResult<Json<Consent>> {
    Ok(Json(
        state
            .context
            .consent_service
            .withdraw_consent(&id, body)
            .await?,
    ))
}

async fn list_for_resident(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Consent>>> {
    Ok(Json(
        state.context.consent_service.list_consents_for_resident(&id)?,
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/consents", post(record_consent))
        .route("/consents/:id", get(get_consent))
        .route("/consents/:id/withdraw", post(withdraw_consent))
        .route("/residents/:id/consents", get(list_for_resident))
}
