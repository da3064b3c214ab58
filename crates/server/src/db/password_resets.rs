//! Password-reset token storage.
//!
//! Only the SHA-256 hash of a token is stored; the plaintext exists solely in
//! the email sent to the customer.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use mff_core::Email;

use super::RepositoryError;

/// A stored reset token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordReset {
    pub email: Email,
    pub expires_at: DateTime<Utc>,
}

impl PasswordReset {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Repository for password-reset tokens.
pub struct PasswordResetRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PasswordResetRepository<'a> {
    /// Create a new password-reset repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new token for `email`, removing any earlier ones.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn replace(
        &self,
        email: &Email,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM mff.password_resets WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO mff.password_resets (token_hash, email, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(token_hash)
        .bind(email)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Look up a token by its hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, token_hash: &str) -> Result<Option<PasswordReset>, RepositoryError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT email, expires_at FROM mff.password_resets WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(reset)
    }

    /// Delete a token by its hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, token_hash: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM mff.password_resets WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
