//! Sail Game Server - real-time synchronization core for a multiplayer
//! sailing simulation
//!
//! This is the main entry point for the server. It handles:
//! - WebSocket connections for real-time gameplay
//! - The authoritative session registry and its fixed-step tick loop
//! - Heartbeat body broadcasts and per-connection latency probes
//!
//! The client-side synchronization components (jitter buffer, clock-offset
//! estimation, prediction, roster shadow) live in the `client` module and
//! are embedded by game frontends.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sail_game_server::app::AppState;
use sail_game_server::config::Config;
use sail_game_server::http::build_router;
use sail_game_server::session::SessionRegistry;
use sail_game_server::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Sail Game Server");
    info!("Server address: {}", config.server_addr);

    // Spawn the authoritative session registry
    let (registry, sessions) =
        SessionRegistry::new(config.heartbeat_interval_ms, config.ping_probe_interval_ms);
    tokio::spawn(async move {
        registry.run().await;
    });

    // Create application state
    let state = AppState::new(config.clone(), sessions);

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
