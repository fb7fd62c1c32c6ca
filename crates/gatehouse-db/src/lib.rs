pub mod pool;
pub mod repos;

// Re-export commonly used items
pub use pool::{create_pool, run_migrations};
pub use repos::refresh_token::{RefreshTokenRepo, RefreshTokenRow};
pub use repos::role::{RoleAssignmentRow, RoleRepo, RoleRow};
pub use repos::user::{CreateUserError, UserRepo, UserRow};
