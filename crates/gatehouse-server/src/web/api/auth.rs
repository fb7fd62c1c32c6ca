use crate::auth::{generate_refresh_token, hash_refresh_token, SESSION_COOKIE};
use crate::state::AppState;
use crate::web::api::error::{ApiError, ApiResult};
use crate::web::api::users::parse_credentials;
use axum::{body::Bytes, extract::State, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use gatehouse_common::models::auth::TokenResponse;
use gatehouse_db::{RefreshTokenRepo, UserRepo, UserRow};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn session_cookie(access_token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, access_token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn parse_refresh_request(body: &[u8]) -> ApiResult<RefreshRequest> {
    serde_json::from_slice(body).map_err(|e| ApiError::Validation(e.to_string()))
}

/// Issue an access token and a stored refresh token for `user`.
async fn issue_tokens(state: &AppState, user: &UserRow) -> ApiResult<TokenResponse> {
    let access_token = state.authenticator.issue_session(user)?;

    let (raw_refresh, refresh_hash) = generate_refresh_token();
    let expires_at = Utc::now() + Duration::days(state.config.auth.refresh_token_ttl_days);
    RefreshTokenRepo::create(&state.pool, &refresh_hash, user.id, expires_at).await?;

    Ok(TokenResponse {
        access_token,
        refresh_token: raw_refresh,
    })
}

/// POST /api/auth/login
#[tracing::instrument(skip(state, jar, body))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let creds = parse_credentials(&body).map_err(ApiError::Validation)?;

    let user = state
        .authenticator
        .authenticate(&state.pool, &creds.email, &creds.password)
        .await?;

    let tokens = issue_tokens(&state, &user).await?;
    tracing::info!(user_id = user.id, "User logged in");

    let jar = jar.add(session_cookie(tokens.access_token.clone()));
    Ok((jar, Json(tokens)))
}

/// POST /api/auth/refresh
#[tracing::instrument(skip(state, jar, body))]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = parse_refresh_request(&body)?;
    let token_hash = hash_refresh_token(&req.refresh_token);

    let token_row = RefreshTokenRepo::get_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or(ApiError::AuthenticationRequired)?;

    // Rotation: whoever deletes the row first owns the refresh
    let deleted = RefreshTokenRepo::delete(&state.pool, &token_hash).await?;
    if !deleted || token_row.expires_at < Utc::now() {
        return Err(ApiError::AuthenticationRequired);
    }

    let user = match UserRepo::get_by_id(&state.pool, token_row.user_id).await? {
        Some(u) if u.active => u,
        _ => return Err(ApiError::AuthenticationRequired),
    };

    let tokens = issue_tokens(&state, &user).await?;
    let jar = jar.add(session_cookie(tokens.access_token.clone()));
    Ok((jar, Json(tokens)))
}

/// POST /api/auth/logout
#[tracing::instrument(skip(state, jar, body))]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let req = parse_refresh_request(&body)?;
    let token_hash = hash_refresh_token(&req.refresh_token);
    RefreshTokenRepo::delete(&state.pool, &token_hash).await?;

    let mut cleared = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cleared.make_removal();
    let jar = jar.add(cleared);
    Ok((jar, Json(json!({"status": "ok"}))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_parse_refresh_request() {
        let req = parse_refresh_request(br#"{"refresh_token": "abc"}"#).unwrap();
        assert_eq!(req.refresh_token, "abc");
        assert!(matches!(
            parse_refresh_request(b"{}"),
            Err(ApiError::Validation(_))
        ));
    }
}
