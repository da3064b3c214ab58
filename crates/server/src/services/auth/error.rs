//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] mff_core::EmailError),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Missing or malformed input other than email/password.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Reset token unknown or already used.
    #[error("invalid or expired reset token")]
    InvalidResetToken,

    /// Reset token found but past its expiry.
    #[error("reset token expired")]
    ResetTokenExpired,

    /// First-admin registration attempted after an admin exists.
    #[error("admin registration is closed")]
    RegistrationClosed,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
