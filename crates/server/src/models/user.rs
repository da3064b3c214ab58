//! Customer account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mff_core::{Email, UserId};

/// A customer account (without its password hash).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, normalised to lower case.
    pub email: Email,
    /// Display name.
    pub name: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}
