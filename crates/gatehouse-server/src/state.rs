use crate::auth::{Authenticator, JwtAuthenticator};
use crate::config::ServerConfig;
use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub authenticator: Arc<dyn Authenticator>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new app state with the JWT authenticator built from `config`
    pub fn new(pool: SqlitePool, config: ServerConfig) -> Result<Self> {
        let authenticator: Arc<dyn Authenticator> =
            Arc::new(JwtAuthenticator::new(&config.auth)?);
        Ok(Self {
            pool,
            authenticator,
            config: Arc::new(config),
        })
    }

    /// Release the connection pool. Call once the server has stopped.
    pub async fn shutdown(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
