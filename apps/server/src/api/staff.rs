use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::put,
    Json, Router,
};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::main_lib::AppState;

#[derive(Debug, Deserialize)]
struct PinRequest {
    pin: String,
}

async fn set_pin(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PinRequest>,
) -> ApiResult<StatusCode> {
    state.context.staff_pin_service.set_pin(&id, &body.pin).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/staff/:id/pin", put(set_pin))
}
