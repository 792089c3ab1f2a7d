use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::prelude::*;

use crdt_relay::adapters::{relay_router, AppState};
use crdt_relay::config::{AppConfig, ConfigError, ServerConfig};
use crdt_relay::domain::relay::SessionRegistry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate().map_err(ConfigError::from)?;

    let registry = Arc::new(SessionRegistry::new(
        config.relay.default_session.clone(),
        config.relay.send_timeout(),
    ));
    let app = relay_router(AppState::from_config(&config, registry.clone()));

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("=== CRDT WebSocket Relay + Static File Server ===");
    info!("Listening on {}", actual_addr);
    info!(
        "Static files: http://{}/ (entry {})",
        actual_addr,
        config.static_files.entry_path().display()
    );
    info!("WebSocket: ws://{}/{{session}}", actual_addr);
    info!("Subprotocol: {}", config.relay.subprotocol);
    info!("CORS enabled for cross-origin requests");

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received shutdown signal");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    let sessions = registry.session_names().await;
    info!(count = sessions.len(), sessions = ?sessions, "Shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if server.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
