use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};

use estate_api::{build_router, AppState};
use estate_infrastructure::{AnonymousIdentityProvider, RealtimeStore};
use estate_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    estate_shared::telemetry::init_telemetry();

    info!("Estate server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if !config.is_production() {
        warn!(env = %config.app.env, "Running outside production");
    }

    // Store and identity provider
    let store = Arc::new(RealtimeStore::from_settings(&config.store));
    let provider = Arc::new(AnonymousIdentityProvider::new(
        config.auth.token_secret.clone(),
        config.auth.token_expiry_secs,
    ));
    info!(
        pubsub_capacity = config.store.pubsub_capacity,
        op_timeout_ms = config.store.op_timeout_ms,
        "Realtime store ready"
    );

    // Bind address
    let host: std::net::IpAddr = config.app.host.parse()?;
    let addr = SocketAddr::from((host, config.app.port));

    // Build router
    let app = build_router(AppState::new(config, store, provider));

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Estate server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
