use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod context;
mod error;
mod events;
mod main_lib;
mod sync_worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env()?;
    main_lib::run(config).await
}
