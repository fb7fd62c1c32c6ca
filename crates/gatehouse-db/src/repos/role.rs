use anyhow::{Context, Result};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// One row of the `roles_users` mapping, joined to the role name
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoleAssignmentRow {
    pub user_id: i64,
    pub name: String,
}

pub struct RoleRepo;

impl RoleRepo {
    pub async fn list(pool: &SqlitePool) -> Result<Vec<RoleRow>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM role ORDER BY id",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list roles")?;
        Ok(rows)
    }

    pub async fn get_by_name(pool: &SqlitePool, name: &str) -> Result<Option<RoleRow>> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM role WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get role by name")?;
        Ok(row)
    }

    /// Return the role with `name`, creating it if it does not exist yet.
    pub async fn find_or_create(
        pool: &SqlitePool,
        name: &str,
        description: Option<&str>,
    ) -> Result<RoleRow> {
        let mut tx = pool.begin().await?;
        sqlx::query("INSERT INTO role (name, description) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .bind(description)
            .execute(&mut *tx)
            .await
            .context("Failed to create role")?;
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description FROM role WHERE name = ?",
        )
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read back role")?;
        tx.commit().await?;
        Ok(row)
    }

    /// Assign a role to a user. Assigning twice is a no-op.
    pub async fn assign(pool: &SqlitePool, user_id: i64, role_id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "INSERT INTO roles_users (user_id, role_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *tx)
        .await
        .context("Failed to assign role")?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_assignments(pool: &SqlitePool) -> Result<Vec<RoleAssignmentRow>> {
        let rows = sqlx::query_as::<_, RoleAssignmentRow>(
            "SELECT ru.user_id, r.name FROM roles_users ru JOIN role r ON r.id = ru.role_id ORDER BY ru.user_id, r.name",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list role assignments")?;
        Ok(rows)
    }
}
