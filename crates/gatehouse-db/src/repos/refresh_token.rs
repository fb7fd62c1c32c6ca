use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRow {
    pub token_hash: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub struct RefreshTokenRepo;

impl RefreshTokenRepo {
    pub async fn create(
        pool: &SqlitePool,
        token_hash: &str,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("INSERT INTO refresh_token (token_hash, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(pool)
            .await
            .context("Failed to create refresh token")?;
        Ok(())
    }

    pub async fn get_by_hash(pool: &SqlitePool, hash: &str) -> Result<Option<RefreshTokenRow>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT token_hash, user_id, expires_at, created_at FROM refresh_token WHERE token_hash = ?",
        )
        .bind(hash)
        .fetch_optional(pool)
        .await
        .context("Failed to get refresh token")?;
        Ok(row)
    }

    /// Delete a token; returns whether a row was removed.
    pub async fn delete(pool: &SqlitePool, hash: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_token WHERE token_hash = ?")
            .bind(hash)
            .execute(pool)
            .await
            .context("Failed to delete refresh token")?;
        Ok(result.rows_affected() > 0)
    }
}
