//! Session middleware configuration.
//!
//! Server-side sessions hold the consumer wizard state. They live in the
//! `mff.session` table (created by migration) and are keyed by the
//! `mff_session` cookie.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "mff_session";

/// Sessions expire after this long without a request (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Build the `PostgreSQL` session store for the `mff.session` table.
///
/// # Errors
///
/// Returns the store's message if the schema or table name is rejected.
pub fn create_session_store(pool: &PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool.clone())
        .with_schema_name("mff")?
        .with_table_name("session")
}

/// Create the session layer around `store`.
#[must_use]
pub fn create_session_layer<Store: SessionStore>(
    store: Store,
    config: &ServerConfig,
) -> SessionManagerLayer<Store> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
