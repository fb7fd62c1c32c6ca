use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Create a SQLite connection pool.
///
/// In-memory databases live only as long as their connection, so they are
/// pinned to a single connection that is never reaped.
pub async fn create_pool(database_url: &str, acquire_timeout: Duration) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("Invalid database url: {}", database_url))?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(acquire_timeout);

    let mut pool_options = SqlitePoolOptions::new().acquire_timeout(acquire_timeout);
    if is_in_memory(database_url) {
        pool_options = pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }

    let pool = pool_options
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}
