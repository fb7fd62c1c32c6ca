use anyhow::{Context, Result};
use gatehouse_db::create_pool;
use gatehouse_server::bootstrap::bootstrap;
use gatehouse_server::config::load_config;
use gatehouse_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Gatehouse server");

    // Load configuration
    let config_path =
        std::env::var("GATEHOUSE_CONFIG").unwrap_or_else(|_| "gatehouse.yaml".to_string());

    tracing::info!("Loading config from: {}", config_path);
    let config = load_config(&config_path)?;

    for setting in config.auth.insecure_settings() {
        tracing::warn!(
            "{} is empty or the insecure built-in default. Do not deploy like this.",
            setting
        );
    }

    // Create database pool
    tracing::info!("Connecting to database...");
    let pool = create_pool(&config.db.url, config.db.acquire_timeout())
        .await
        .context("Failed to create database pool")?;

    // Build application state
    let state = AppState::new(pool, config.clone()).context("Failed to build app state")?;

    // Schema and seed account, before any request is served
    let seed_outcome = bootstrap(
        &state.pool,
        state.authenticator.as_ref(),
        config.auth.seed_user.as_ref(),
    )
    .await
    .context("Bootstrap failed")?;
    tracing::info!("Bootstrap complete: seed user {:?}", seed_outcome);

    // Build router
    let app = gatehouse_server::web::build_router(state.clone());

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen))?;

    tracing::info!("Server listening on {}", config.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping...");
}
