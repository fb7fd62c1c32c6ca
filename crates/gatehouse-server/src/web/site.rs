//! Top-level pages outside the `/api` prefix.

use crate::state::AppState;
use crate::web::api::error::ApiResult;
use crate::web::api::middleware::AuthUser;
use axum::{extract::State, response::IntoResponse, Json};
use gatehouse_common::models::listing::{DataListing, RoleSummary, UserSummary};
use gatehouse_db::{RoleAssignmentRow, RoleRepo, RoleRow, UserRepo, UserRow};
use serde_json::json;
use std::sync::Arc;

pub const PUBLIC_INFO_MESSAGE: &str =
    "This is public information accessible without authentication.";

/// GET /
#[tracing::instrument(skip(auth))]
pub async fn home(auth: AuthUser) -> String {
    format!("Hello {}", auth.0.email)
}

/// GET /public-info
pub async fn public_info() -> impl IntoResponse {
    Json(json!({ "message": PUBLIC_INFO_MESSAGE }))
}

/// GET /data -- every user with their role names, and every role.
///
/// Public, unlike `GET /api/user`; see `ROUTE_POLICIES`.
#[tracing::instrument(skip(state))]
pub async fn show_data(State(state): State<Arc<AppState>>) -> ApiResult<Json<DataListing>> {
    let users = UserRepo::list(&state.pool).await?;
    let roles = RoleRepo::list(&state.pool).await?;
    let assignments = RoleRepo::list_assignments(&state.pool).await?;

    Ok(Json(build_listing(&users, &roles, &assignments)))
}

fn build_listing(
    users: &[UserRow],
    roles: &[RoleRow],
    assignments: &[RoleAssignmentRow],
) -> DataListing {
    let users = users
        .iter()
        .map(|u| UserSummary {
            id: u.id,
            email: u.email.clone(),
            active: u.active,
            confirmed_at: u.confirmed_at.map(|t| t.to_rfc3339()),
            roles: assignments
                .iter()
                .filter(|a| a.user_id == u.id)
                .map(|a| a.name.clone())
                .collect(),
        })
        .collect();

    let roles = roles
        .iter()
        .map(|r| RoleSummary {
            id: r.id,
            name: r.name.clone(),
            description: r.description.clone(),
        })
        .collect();

    DataListing { users, roles }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn user(id: i64, email: &str) -> UserRow {
        UserRow {
            id,
            email: email.to_string(),
            password: "$argon2id$hash".to_string(),
            active: true,
            confirmed_at: None,
        }
    }

    fn assignment(user_id: i64, name: &str) -> RoleAssignmentRow {
        RoleAssignmentRow {
            user_id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_listing_groups_roles_per_user() {
        let users = vec![user(1, "a@x.com"), user(2, "b@x.com")];
        let roles = vec![
            RoleRow {
                id: 1,
                name: "admin".to_string(),
                description: Some("Administrators".to_string()),
            },
            RoleRow {
                id: 2,
                name: "editor".to_string(),
                description: None,
            },
        ];
        let assignments = vec![assignment(1, "admin"), assignment(1, "editor")];

        let listing = build_listing(&users, &roles, &assignments);
        assert_eq!(listing.users[0].roles, vec!["admin", "editor"]);
        assert!(listing.users[1].roles.is_empty());
        assert_eq!(listing.roles.len(), 2);
        assert_eq!(listing.roles[1].description, None);
    }

    #[test]
    fn test_listing_never_exposes_password() {
        let listing = build_listing(&[user(1, "a@x.com")], &[], &[]);
        let text = serde_json::to_string(&listing).unwrap();
        assert!(!text.contains("argon2"));
        assert!(!text.contains("password"));
    }

    #[test]
    fn test_listing_confirmed_at_is_iso8601() {
        let mut confirmed = user(1, "a@x.com");
        confirmed.confirmed_at = Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());

        let listing = build_listing(&[confirmed, user(2, "b@x.com")], &[], &[]);
        assert_eq!(
            listing.users[0].confirmed_at.as_deref(),
            Some("2024-03-01T12:30:00+00:00")
        );
        assert_eq!(listing.users[1].confirmed_at, None);
    }
}
