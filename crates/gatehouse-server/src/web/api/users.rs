use crate::state::AppState;
use crate::web::api::middleware::AuthUser;
use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gatehouse_common::models::auth::{Credentials, User};
use gatehouse_db::{CreateUserError, UserRepo, UserRow};
use serde_json::json;
use std::sync::Arc;

/// Result of a registration attempt. Only `Created` reaches the caller as a
/// success; every other variant becomes the same generic 400.
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(User),
    DuplicateEmail,
    ValidationError(String),
    StoreError(anyhow::Error),
}

impl IntoResponse for CreateUserOutcome {
    fn into_response(self) -> Response {
        let cause = match self {
            CreateUserOutcome::Created(user) => {
                tracing::info!(user_id = user.id, "User created");
                return (
                    StatusCode::CREATED,
                    Json(json!({"message": "User created successfully"})),
                )
                    .into_response();
            }
            CreateUserOutcome::DuplicateEmail => "email already registered".to_string(),
            CreateUserOutcome::ValidationError(detail) => detail,
            CreateUserOutcome::StoreError(e) => format!("{:#}", e),
        };
        tracing::error!("Failed to create user: {}", cause);
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Failed to create user"})),
        )
            .into_response()
    }
}

impl From<UserRow> for CreateUserOutcome {
    fn from(row: UserRow) -> Self {
        CreateUserOutcome::Created(User {
            id: row.id,
            email: row.email,
            active: row.active,
            confirmed_at: row.confirmed_at,
        })
    }
}

/// Parse and validate a credentials body regardless of content type.
pub(crate) fn parse_credentials(body: &[u8]) -> Result<Credentials, String> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| format!("malformed body: {}", e))?;
    // serde would otherwise accept `["email", "password"]` as a struct
    if !value.is_object() {
        return Err("body is not a JSON object".to_string());
    }
    let mut creds: Credentials =
        serde_json::from_value(value).map_err(|e| format!("malformed body: {}", e))?;
    creds.email = creds.email.trim().to_string();
    if creds.email.is_empty() || !creds.email.contains('@') {
        return Err("email is missing or malformed".to_string());
    }
    if creds.password.is_empty() {
        return Err("password is empty".to_string());
    }
    Ok(creds)
}

/// Register a new account from a raw request body.
pub async fn register(state: &AppState, body: &[u8]) -> CreateUserOutcome {
    let creds = match parse_credentials(body) {
        Ok(c) => c,
        Err(detail) => return CreateUserOutcome::ValidationError(detail),
    };

    let password_hash = match state
        .authenticator
        .hash(&creds.password)
        .context("Failed to hash password")
    {
        Ok(h) => h,
        Err(e) => return CreateUserOutcome::StoreError(e),
    };

    match UserRepo::create(&state.pool, &creds.email, &password_hash).await {
        Ok(row) => row.into(),
        Err(CreateUserError::DuplicateEmail) => CreateUserOutcome::DuplicateEmail,
        Err(CreateUserError::Store(e)) => CreateUserOutcome::StoreError(e.into()),
    }
}

/// POST /api/user
#[tracing::instrument(skip(state, body))]
pub async fn create_user(State(state): State<Arc<AppState>>, body: Bytes) -> CreateUserOutcome {
    register(&state, &body).await
}

/// GET /api/user
#[tracing::instrument(skip(auth), fields(user_id = auth.0.id))]
pub async fn get_user_info(auth: AuthUser) -> impl IntoResponse {
    Json(json!({"email": auth.0.email}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(outcome: CreateUserOutcome) -> (StatusCode, serde_json::Value) {
        let response = outcome.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_parse_credentials_valid() {
        let creds = parse_credentials(br#"{"email": " a@x.com ", "password": "pw1"}"#).unwrap();
        assert_eq!(creds.email, "a@x.com");
        assert_eq!(creds.password, "pw1");
    }

    #[test]
    fn test_parse_credentials_rejects_bad_input() {
        assert!(parse_credentials(b"not json").is_err());
        assert!(parse_credentials(b"").is_err());
        assert!(parse_credentials(br#"{"email": "a@x.com"}"#).is_err());
        assert!(parse_credentials(br#"{"password": "pw"}"#).is_err());
        assert!(parse_credentials(br#"{"email": "", "password": "pw"}"#).is_err());
        assert!(parse_credentials(br#"{"email": "no-at-sign", "password": "pw"}"#).is_err());
        assert!(parse_credentials(br#"{"email": "a@x.com", "password": ""}"#).is_err());
        assert!(parse_credentials(br#"{"email": 5, "password": "pw"}"#).is_err());
        assert!(parse_credentials(br#"["a@x.com", "pw"]"#).is_err());
        assert!(parse_credentials(br#""a@x.com""#).is_err());
        assert!(parse_credentials(b"null").is_err());
    }

    #[tokio::test]
    async fn test_created_maps_to_201() {
        let outcome = CreateUserOutcome::Created(User {
            id: 1,
            email: "a@x.com".to_string(),
            active: true,
            confirmed_at: None,
        });
        let (status, body) = response_parts(outcome).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"message": "User created successfully"}));
    }

    #[tokio::test]
    async fn test_failures_map_to_generic_400() {
        let outcomes = vec![
            CreateUserOutcome::DuplicateEmail,
            CreateUserOutcome::ValidationError("missing field `email`".to_string()),
            CreateUserOutcome::StoreError(anyhow::anyhow!("disk I/O error")),
        ];
        for outcome in outcomes {
            let (status, body) = response_parts(outcome).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"error": "Failed to create user"}));
        }
    }
}
