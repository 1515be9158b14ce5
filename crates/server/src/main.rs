use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waitline_core::{
    create_pager, create_store, create_verifier, load_config, validate_config, CounterStore,
    NotificationDispatcher, Pager, QueueEngine, TokenVerifier,
};

use waitline_server::api::create_router;
use waitline_server::broadcast::BranchBroadcaster;
use waitline_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("WAITLINE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Auth method: {:?}", config.auth.method);
    info!("Store backend: {:?}", config.store.backend);
    info!("Pager backend: {:?}", config.pager.backend);

    // Create token verifier
    let verifier: Arc<dyn TokenVerifier> =
        Arc::from(create_verifier(&config.auth).context("Failed to create token verifier")?);
    info!("Using token verifier: {}", verifier.method_name());

    // Create counter store
    let store: Arc<dyn CounterStore> =
        Arc::from(create_store(&config.store).context("Failed to create counter store")?);
    info!("Counter store initialized");

    // Create queue engine with the configured per-operation timeout
    let op_timeout = Duration::from_millis(config.engine.op_timeout_ms);
    let engine = Arc::new(QueueEngine::with_timeout(store, op_timeout));

    // Create notification dispatcher
    let pager: Arc<dyn Pager> =
        Arc::from(create_pager(&config.pager).context("Failed to create pager")?);
    info!("Using pager: {}", pager.backend_name());
    let dispatcher = NotificationDispatcher::new(pager);

    // Create branch broadcaster for real-time updates
    let broadcaster = BranchBroadcaster::new();
    info!("Branch broadcaster initialized");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        verifier,
        engine,
        dispatcher,
        broadcaster,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
