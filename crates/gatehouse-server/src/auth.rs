use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use gatehouse_common::models::auth::Claims;
use gatehouse_db::{UserRepo, UserRow};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::config::AuthConfig;

/// Cookie carrying the access token for browser clients
pub const SESSION_COOKIE: &str = "gatehouse_session";

/// Why a login attempt was refused.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email, wrong password and disabled account all look the same.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Password hashing and session handling behind the HTTP layer.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// One-way salted hash of `password`.
    fn hash(&self, password: &str) -> Result<String>;

    /// Whether `password` matches `hash`. Malformed hashes never match.
    fn verify(&self, password: &str, hash: &str) -> bool;

    /// Issue a signed access token for `user`.
    fn issue_session(&self, user: &UserRow) -> Result<String>;

    /// Resolve the request's bearer token or session cookie to an active user.
    async fn resolve_session(&self, pool: &SqlitePool, headers: &HeaderMap) -> Option<UserRow>;

    /// Check an email/password pair against the store.
    async fn authenticate(
        &self,
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<UserRow, AuthError>;
}

/// argon2id hashing peppered with `SECURITY_PASSWORD_SALT`, HS256 JWT sessions
/// signed with `SECRET_KEY`.
pub struct JwtAuthenticator {
    pepper: Vec<u8>,
    jwt_secret: String,
    access_token_ttl_secs: i64,
    /// Verified against for unknown emails so both failure paths cost the same
    dummy_hash: String,
}

impl JwtAuthenticator {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let mut authenticator = Self {
            pepper: config.password_salt.as_bytes().to_vec(),
            jwt_secret: config.secret_key.clone(),
            access_token_ttl_secs: config.access_token_ttl_secs,
            dummy_hash: String::new(),
        };
        authenticator.dummy_hash = authenticator
            .hash("gatehouse-dummy-password")
            .context("Failed to prepare dummy password hash")?;
        Ok(authenticator)
    }

    fn argon2(&self) -> Result<Argon2<'_>> {
        Argon2::new_with_secret(
            &self.pepper,
            Algorithm::Argon2id,
            Version::V0x13,
            Params::default(),
        )
        .map_err(|e| anyhow::anyhow!("Invalid password pepper: {}", e))
    }

    /// Validate an access token and return claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        let token_data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .context("Invalid access token")?;
        Ok(token_data.claims)
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()?
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };
        match self.argon2() {
            Ok(argon2) => argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(_) => false,
        }
    }

    fn issue_session(&self, user: &UserRow) -> Result<String> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp: now + self.access_token_ttl_secs,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .context("Failed to create access token")
    }

    async fn resolve_session(&self, pool: &SqlitePool, headers: &HeaderMap) -> Option<UserRow> {
        let token = session_token(headers)?;
        let claims = self.validate_access_token(&token).ok()?;
        let user_id: i64 = claims.sub.parse().ok()?;

        match UserRepo::get_by_id(pool, user_id).await {
            Ok(Some(user)) if user.active => Some(user),
            Ok(_) => None,
            Err(e) => {
                tracing::error!("Failed to load session user: {:#}", e);
                None
            }
        }
    }

    async fn authenticate(
        &self,
        pool: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<UserRow, AuthError> {
        let user = UserRepo::get_by_email(pool, email).await?;
        let Some(user) = user else {
            let _ = self.verify(password, &self.dummy_hash);
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify(password, &user.password) || !user.active {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(user)
    }
}

/// Pull the access token from `Authorization: Bearer` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let token = value.to_str().ok()?.strip_prefix("Bearer ")?.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Generate a refresh token: returns (raw_token, token_hash)
pub fn generate_refresh_token() -> (String, String) {
    let raw = uuid::Uuid::new_v4().to_string();
    let hash = hash_refresh_token(&raw);
    (raw, hash)
}

/// Hash a refresh token using SHA256
pub fn hash_refresh_token(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    format!("{:x}", hasher.finalize())
}
