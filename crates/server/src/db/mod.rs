//! Database operations for the `mff` schema.
//!
//! ## Tables
//!
//! - `users` - Customer accounts
//! - `admins` - Staff accounts (never shared with customers)
//! - `orders` - Funeral-music orders keyed by `MFF0001`-style numbers
//! - `form_progress` - One step-keyed JSON document per order
//! - `password_resets` - Hashed single-use reset tokens
//! - `service_items`, `pricing_plans`, `faq_items`, `how_it_works_items`,
//!   `content_sections`, `demo_videos` - CMS content
//! - `session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p mff-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod admins;
pub mod content;
pub mod form_progress;
pub mod orders;
pub mod password_resets;
pub mod users;

pub use admins::AdminRepository;
pub use content::ContentRepository;
pub use form_progress::{FormProgressRecord, FormProgressRepository};
pub use orders::OrderRepository;
pub use password_resets::PasswordResetRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email) or stale revision.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique_violation(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
