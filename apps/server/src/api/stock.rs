use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use carehome_core::stock::{StockAlert, StockLevel};

use crate::error::ApiResult;
use crate::main_lib::AppState;

async fn get_stock(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<StockLevel>> {
    Ok(Json(state.context.stock_service.get_stock_level(&id)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiveRequest {
    quantity: Decimal,
    expiry_date: Option<NaiveDate>,
}

async fn receive_stock(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReceiveRequest>,
) -> ApiResult<Json<StockLevel>> {
    Ok(Json(
        state
            .context
            .stock_service
            .receive_stock(&id, body.quantity, body.expiry_date)
            .await?,
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThresholdsRequest {
    reorder_threshold: Decimal,
    critical_threshold: Decimal,
}

async fn set_thresholds(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ThresholdsRequest>,
) -> ApiResult<Json<StockLevel>> {
    Ok(Json(
        state
            .context
            .stock_service
            .set_thresholds(&id, body.reorder_threshold, body.critical_threshold)
            .await?,
    ))
}

async fn list_alerts(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<StockAlert>>> {
    Ok(Json(
        state
            .context
            .stock_service
            .list_alerts(Utc::now().date_naive())?,
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stock/alerts", get(list_alerts))
        .route("/stock/:id", get(get_stock))
        .route("/stock/:id/receive", post(receive_stock))
        .route("/stock/:id/thresholds", put(set_thresholds))
}
