//! Shapes returned by the `/data` listing endpoint.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i64,
    pub email: String,
    pub active: bool,
    /// RFC 3339 timestamp, `null` when the account was never confirmed.
    pub confirmed_at: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataListing {
    pub users: Vec<UserSummary>,
    pub roles: Vec<RoleSummary>,
}
