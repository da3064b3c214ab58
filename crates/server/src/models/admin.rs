//! Admin account types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mff_core::{AdminId, Email};

/// A staff account (without its password hash).
///
/// Admins live in their own table and never share identity with customers.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    /// Unique admin ID.
    pub id: AdminId,
    /// Login email.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// When the admin was created.
    pub created_at: DateTime<Utc>,
}
