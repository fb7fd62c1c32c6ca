pub mod auth;
pub mod error;
pub mod middleware;
pub mod users;

use crate::state::AppState;
use axum::{routing::get, routing::post, Router};
use std::sync::Arc;

pub fn build_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // GET requires a session, POST is open registration
        .route("/user", get(users::get_user_info).post(users::create_user))
        // Auth routes
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .with_state(state)
}
