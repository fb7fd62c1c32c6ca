use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced at the route boundary. Callers only ever see the generic
/// message for the variant; details stay in the server log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("authentication required")]
    AuthenticationRequired,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationRequired | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Invalid request body",
            ApiError::AuthenticationRequired => "Authentication required",
            ApiError::InvalidCredentials => "Invalid email or password",
            ApiError::NotFound => "Not found",
            ApiError::Internal(_) => "Internal server error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(e) => tracing::error!("Internal error: {:#}", e),
            ApiError::Validation(detail) => tracing::warn!("Rejected request: {}", detail),
            _ => tracing::debug!("Request failed: {}", self),
        }

        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}

impl From<crate::auth::AuthError> for ApiError {
    fn from(err: crate::auth::AuthError) -> Self {
        match err {
            crate::auth::AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            crate::auth::AuthError::Internal(e) => ApiError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::AuthenticationRequired.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let err = ApiError::Internal(anyhow::anyhow!("database is locked: /var/lib/secret.db"));
        let body = body_json(err.into_response()).await;
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_validation_error_hides_details() {
        let err = ApiError::Validation("missing field `password` at line 1".into());
        let body = body_json(err.into_response()).await;
        assert_eq!(body, json!({"error": "Invalid request body"}));
    }
}
