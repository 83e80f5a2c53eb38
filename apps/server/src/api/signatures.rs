use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use carehome_core::signatures::{Signature, SignatureInput};

use crate::error::ApiResult;
use crate::main_lib::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredSignature {
    signature_id: String,
}

async fn store_signature(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignatureInput>,
) -> ApiResult<(StatusCode, Json<StoredSignature>)> {
    let signature_id = state.context.signature_service.store_signature(body).await?;
    Ok((StatusCode::CREATED, Json(StoredSignature { signature_id })))
}

async fn get_signature(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Signature>> {
    Ok(Json(state.context.signature_service.get_signature(&id)?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signatures", post(store_signature))
        .route("/signatures/:id", get(get_signature))
}
