use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    /// argon2 PHC string, never the cleartext password
    pub password: String,
    pub active: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

/// Why a user could not be inserted.
#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("a user with this email already exists")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Store(#[from] sqlx::Error),
}

const USER_COLUMNS: &str = "id, email, password, active, confirmed_at";

pub struct UserRepo;

impl UserRepo {
    /// Insert a new active user. Email uniqueness is decided by the store's
    /// UNIQUE constraint, so concurrent registrations cannot both succeed.
    pub async fn create(
        pool: &SqlitePool,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow, CreateUserError> {
        let mut tx = pool.begin().await?;
        let inserted = sqlx::query_as::<_, UserRow>(&format!(
            r#"INSERT INTO "user" (email, password, active) VALUES (?, ?, 1) RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await;

        let row = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(CreateUserError::DuplicateEmail)
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(row)
    }

    pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {} FROM "user" WHERE email = ?"#,
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;
        Ok(row)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {} FROM "user" WHERE id = ?"#,
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by id")?;
        Ok(row)
    }

    pub async fn list(pool: &SqlitePool) -> Result<Vec<UserRow>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"SELECT {} FROM "user" ORDER BY id"#,
            USER_COLUMNS
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;
        Ok(rows)
    }

    pub async fn count_by_email(pool: &SqlitePool, email: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM "user" WHERE email = ?"#)
            .bind(email)
            .fetch_one(pool)
            .await
            .context("Failed to count users by email")?;
        Ok(count)
    }

    pub async fn set_confirmed_at(
        pool: &SqlitePool,
        id: i64,
        confirmed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let mut tx = pool.begin().await?;
        sqlx::query(r#"UPDATE "user" SET confirmed_at = ? WHERE id = ?"#)
            .bind(confirmed_at)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update confirmed_at")?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_active(pool: &SqlitePool, id: i64, active: bool) -> Result<()> {
        let mut tx = pool.begin().await?;
        sqlx::query(r#"UPDATE "user" SET active = ? WHERE id = ?"#)
            .bind(active)
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update active flag")?;
        tx.commit().await?;
        Ok(())
    }
}
