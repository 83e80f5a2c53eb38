//! Application state, router assembly and the serve loop.

use std::sync::Arc;

use axum::Router;
use tracing::info;

use crate::api;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::events::EventBus;
use crate::sync_worker::spawn_sync_worker;

pub struct AppState {
    pub context: ServiceContext,
    pub event_bus: EventBus,
    pub config: Config,
}

pub fn build_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let event_bus = EventBus::default();
    let context = ServiceContext::initialize(&config, Arc::new(event_bus.clone()))?;
    Ok(Arc::new(AppState {
        context,
        event_bus,
        config,
    }))
}

pub fn app_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api::router())
        .with_state(state)
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = build_state(config)?;

    if state.context.sync_configured {
        spawn_sync_worker(
            state.context.sync_service.clone(),
            state.config.sync_interval_secs,
        );
    }

    let listener = tokio::net::TcpListener::bind(state.config.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
