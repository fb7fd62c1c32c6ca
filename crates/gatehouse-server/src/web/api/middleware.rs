use crate::state::AppState;
use crate::web::api::error::ApiError;
use axum::{extract::FromRequestParts, http::request::Parts};
use gatehouse_db::UserRow;
use std::sync::Arc;

/// Extractor guarding a route: resolves the bearer token or session cookie
/// to an active user, or ends the request with 401 before the handler runs.
/// Routes without this extractor are public.
#[derive(Debug)]
pub struct AuthUser(pub UserRow);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state
            .authenticator
            .resolve_session(&state.pool, &parts.headers)
            .await
            .map(AuthUser)
            .ok_or(ApiError::AuthenticationRequired)
    }
}
