//! REST surface mounted under `/api/v1`.

use std::sync::Arc;

use axum::Router;

use crate::main_lib::AppState;

mod consents;
mod events;
mod health;
mod medications;
mod residents;
mod signatures;
mod staff;
mod stock;
mod sync;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::router())
        .merge(residents::router())
        .merge(medications::router())
        .merge(stock::router())
        .merge(staff::router())
        .merge(consents::router())
        .merge(signatures::router())
        .merge(sync::router())
        .merge(events::router())
}
