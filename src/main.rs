//! Giftbid service binary.
//!
//! Wires the pieces together: environment configuration, structured
//! logging, the shared store, the leader-elected round engine as a
//! background task, and the HTTP server with graceful shutdown.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use giftbid_core::SystemClock;
use giftbid_engine::RoundEngine;
use giftbid_server::{create_app, AppState};
use giftbid_store::Store;
use giftbid_types::{constants, EngineConfig, ServerConfig};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::builder()
        .with_env_var("LOG_LEVEL")
        .try_from_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let server_config = ServerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    info!(
        version = constants::VERSION,
        poll_interval_ms = engine_config.poll_interval_ms,
        "starting {}",
        constants::SERVICE_NAME
    );

    let store = Store::new();
    let clock = Arc::new(SystemClock);

    let engine = RoundEngine::new(store.clone(), clock.clone(), engine_config);
    let engine_handle = engine.handle();
    let engine_task = tokio::spawn(engine.run());

    let state = AppState::new(store, clock);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr()).await?;
    info!(addr = %server_config.bind_addr(), "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine_handle.stop();
    let _ = engine_task.await;
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
