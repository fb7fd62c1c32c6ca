//! One-time startup routine: schema creation and the seed account.

use crate::auth::Authenticator;
use crate::config::SeedUserConfig;
use anyhow::{Context, Result};
use gatehouse_db::{run_migrations, CreateUserError, RoleRepo, UserRepo, UserRow};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
    Disabled,
}

/// Create the schema if absent and make sure the seed account exists.
///
/// Safe to run on every start against a persistent database.
pub async fn bootstrap(
    pool: &SqlitePool,
    authenticator: &dyn Authenticator,
    seed: Option<&SeedUserConfig>,
) -> Result<SeedOutcome> {
    tracing::info!("Running database migrations...");
    run_migrations(pool)
        .await
        .context("Failed to run migrations")?;

    let Some(seed) = seed else {
        return Ok(SeedOutcome::Disabled);
    };

    let (user, outcome) = ensure_seed_user(pool, authenticator, seed).await?;

    for role_name in &seed.roles {
        let role = RoleRepo::find_or_create(pool, role_name, None)
            .await
            .with_context(|| format!("Failed to create seed role '{}'", role_name))?;
        RoleRepo::assign(pool, user.id, role.id)
            .await
            .with_context(|| format!("Failed to assign seed role '{}'", role_name))?;
    }

    Ok(outcome)
}

async fn ensure_seed_user(
    pool: &SqlitePool,
    authenticator: &dyn Authenticator,
    seed: &SeedUserConfig,
) -> Result<(UserRow, SeedOutcome)> {
    if let Some(user) = UserRepo::get_by_email(pool, &seed.email).await? {
        tracing::info!("Seed user '{}' already exists, skipping seed", seed.email);
        return Ok((user, SeedOutcome::AlreadyPresent));
    }

    let password_hash = authenticator
        .hash(&seed.password)
        .context("Failed to hash seed user password")?;

    match UserRepo::create(pool, &seed.email, &password_hash).await {
        Ok(user) => {
            tracing::info!("Created seed user: {}", seed.email);
            Ok((user, SeedOutcome::Created))
        }
        // Another process seeded between the lookup and the insert
        Err(CreateUserError::DuplicateEmail) => {
            let user = UserRepo::get_by_email(pool, &seed.email)
                .await?
                .context("Seed user vanished after duplicate insert")?;
            Ok((user, SeedOutcome::AlreadyPresent))
        }
        Err(e) => Err(anyhow::Error::new(e).context("Failed to create seed user")),
    }
}
