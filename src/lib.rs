pub mod api;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;
pub mod token;

pub use config::Config;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("authgate v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state(&config).await?;

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    let bind_addr = config.bind_addr.clone();
    let server_handle = tokio::spawn(async move {
        info!("Auth API running at http://{}", bind_addr);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    server_handle.abort();
    info!("Stopped");

    Ok(())
}
