//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account (password from MFF_ADMIN_PASSWORD or --password)
//! MFF_ADMIN_PASSWORD='...' mff-cli admin create -e admin@example.com -n "Admin Name"
//!
//! # List admin accounts
//! mff-cli admin list
//! ```

use thiserror::Error;

use mff_server::db::{AdminRepository, RepositoryError};
use mff_server::services::{AuthError, AuthService};

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Validation or uniqueness failure from the auth service.
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create an admin account.
///
/// Unlike the API's bootstrap registration this works whether or not other
/// admins exist.
///
/// # Returns
///
/// The ID of the created admin.
pub async fn create(email: &str, name: &str, password: &str) -> Result<i32, AdminError> {
    let pool = connect().await?;

    tracing::info!("Creating admin: {}", email);
    let admin = AuthService::new(&pool)
        .create_admin(email, password, name)
        .await?;

    tracing::info!(
        "Admin created successfully! ID: {}, Email: {}",
        admin.id,
        admin.email
    );
    Ok(admin.id.as_i32())
}

/// Log every admin account.
pub async fn list() -> Result<(), AdminError> {
    let pool = connect().await?;
    let admins = AdminRepository::new(&pool).list().await?;

    tracing::info!("{} admin account(s)", admins.len());
    for admin in admins {
        tracing::info!(
            "  {} {} <{}> created {}",
            admin.id,
            admin.name,
            admin.email,
            admin.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
