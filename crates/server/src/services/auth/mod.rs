//! Authentication service.
//!
//! Password login and registration for customers and admins, plus the
//! password-reset token flow. Credentials (signed tokens) are issued by the
//! caller through [`crate::services::CredentialService`]; this service only
//! decides *who* someone is.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use mff_core::Email;

use crate::db::{AdminRepository, PasswordResetRepository, RepositoryError, UserRepository};
use crate::models::{Admin, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Random bytes in a password-reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    admins: AdminRepository<'a>,
    resets: PasswordResetRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            admins: AdminRepository::new(pool),
            resets: PasswordResetRepository::new(pool),
        }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::AccountAlreadyExists` if the email is already registered.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        self.users
            .create(&email, name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Log a customer in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(user)
    }

    // =========================================================================
    // Admins
    // =========================================================================

    /// Log an admin in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login_admin(&self, email: &str, password: &str) -> Result<Admin, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (admin, password_hash) = self
            .admins
            .get_with_password(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(admin)
    }

    /// Create the first admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RegistrationClosed` once any admin exists.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Admin, AuthError> {
        let (email, name, password_hash) = prepare_admin(email, password, name)?;

        self.admins
            .create_first(&email, &name, &password_hash)
            .await?
            .ok_or(AuthError::RegistrationClosed)
    }

    /// Create an additional admin account (caller must already be an admin).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountAlreadyExists` if the email is taken.
    pub async fn create_admin(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Admin, AuthError> {
        let (email, name, password_hash) = prepare_admin(email, password, name)?;

        self.admins
            .create(&email, &name, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Issue a reset token for the customer with `email`.
    ///
    /// Returns `Ok(None)` for unknown or malformed addresses so callers can
    /// answer identically either way. Earlier tokens for the address are
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the token cannot be stored.
    pub async fn start_password_reset(
        &self,
        email: &str,
        ttl: Duration,
    ) -> Result<Option<(Email, String)>, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Ok(None);
        };
        if self.users.get_by_email(&email).await?.is_none() {
            return Ok(None);
        }

        let token = generate_reset_token();
        self.resets
            .replace(&email, &hash_reset_token(&token), Utc::now() + ttl)
            .await?;

        tracing::info!(email = %email, "Password reset token issued");
        Ok(Some((email, token)))
    }

    /// Set a new password using a reset token.
    ///
    /// The token is consumed on success. An expired token is deleted and
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` for unknown tokens,
    /// `AuthError::ResetTokenExpired` for expired ones and
    /// `AuthError::WeakPassword` if the new password is too short.
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let token_hash = hash_reset_token(token.trim());
        let reset = self
            .resets
            .find(&token_hash)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if reset.is_expired(Utc::now()) {
            self.resets.delete(&token_hash).await?;
            return Err(AuthError::ResetTokenExpired);
        }

        validate_password(new_password)?;
        let password_hash = hash_password(new_password)?;

        self.users
            .update_password(&reset.email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidResetToken,
                other => AuthError::Repository(other),
            })?;
        self.resets.delete(&token_hash).await?;

        tracing::info!(email = %reset.email, "Password reset completed");
        Ok(())
    }
}

fn prepare_admin(
    email: &str,
    password: &str,
    name: &str,
) -> Result<(Email, String, String), AuthError> {
    let email = Email::parse(email)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AuthError::InvalidInput("name is required".to_string()));
    }
    validate_password(password)?;
    let password_hash = hash_password(password)?;
    Ok((email, name.to_string(), password_hash))
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a URL-safe reset token (hex of 32 random bytes).
fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The stored form of a reset token.
fn hash_reset_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("eightchr").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse battery", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_tokens_are_random_and_hashed() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_BYTES * 2);
        assert_ne!(a, b);

        let hash = hash_reset_token(&a);
        assert_eq!(hash.len(), 64);
        assert_ne!(hash, a);
        assert_eq!(hash, hash_reset_token(&a));
    }

    #[test]
    fn test_prepare_admin_requires_name() {
        assert!(matches!(
            prepare_admin("ops@mff.test", "longenough", "  "),
            Err(AuthError::InvalidInput(_))
        ));
    }
}
