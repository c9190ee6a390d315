//! Cactus Gateway Server - HTTP API for tool-calling inference and transcription

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod error;
mod state;

use cactus_gateway_core::{CactusBridge, GatewayConfig, ModelHandleManager, TranscriptionService};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cactus_gateway_server=debug,cactus_gateway_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cactus Gateway");

    // Load configuration
    let config = GatewayConfig::load()?;
    info!("Model weights: {:?}", config.cactus_weights_path);

    // The model is loaded lazily on the first inference request
    let engine = Arc::new(CactusBridge::new(config.bridge_config()));
    let models = Arc::new(ModelHandleManager::new(
        engine,
        config.cactus_weights_path.clone(),
    ));
    let transcription = TranscriptionService::new(config.transcription_config())?;
    info!(
        "Transcription {}",
        if transcription.is_configured() {
            "enabled"
        } else {
            "disabled"
        }
    );
    let state = AppState::new(models, transcription);

    // Build router
    let app = api::create_router(state.clone());

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Runs once, after in-flight requests have drained
    if let Err(e) = state.models.release().await {
        error!("Failed to release Cactus model: {}", e);
    }
    info!("Shutdown complete");

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        },
    }
}
