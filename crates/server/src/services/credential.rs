//! Signed credentials for customers and admins.
//!
//! One service issues and verifies both kinds of credential. Each token
//! carries its [`PrincipalType`] as the audience claim, so a customer token
//! never verifies where an admin token is required (and vice versa), even
//! though both are signed with the same secret.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mff_core::{AdminId, Email, PrincipalType, UserId};

use crate::config::TokenConfig;

/// Token issuer claim.
const ISSUER: &str = "music-for-funerals";

/// Claims carried by every credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal ID (user or admin, depending on `aud`).
    pub sub: String,
    /// Principal email at issue time.
    pub email: String,
    /// Audience; one value per [`PrincipalType`].
    pub aud: String,
    /// Issuer.
    pub iss: String,
    /// Expiry timestamp.
    pub exp: i64,
    /// Issued-at timestamp.
    pub iat: i64,
}

impl Claims {
    /// The kind of principal this credential was issued for.
    #[must_use]
    pub fn principal_type(&self) -> Option<PrincipalType> {
        [PrincipalType::EndUser, PrincipalType::Admin]
            .into_iter()
            .find(|p| p.audience() == self.aud)
    }

    /// The customer ID, if this is an end-user credential.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        (self.principal_type() == Some(PrincipalType::EndUser))
            .then(|| self.sub.parse().ok())
            .flatten()
    }

    /// The admin ID, if this is an admin credential.
    #[must_use]
    pub fn admin_id(&self) -> Option<AdminId> {
        (self.principal_type() == Some(PrincipalType::Admin))
            .then(|| self.sub.parse().ok())
            .flatten()
    }
}

/// A freshly signed credential.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    pub token: String,
    pub principal: PrincipalType,
    pub expires_at: DateTime<Utc>,
}

impl IssuedCredential {
    /// Lifetime left, for the cookie `Max-Age`.
    #[must_use]
    pub fn max_age_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }
}

/// Credential errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid credential: {0}")]
    Invalid(String),

    #[error("credential expired")]
    Expired,

    #[error("credential issued for a different principal")]
    WrongPrincipal,

    #[error("failed to sign credential: {0}")]
    Signing(String),
}

/// Issues and verifies signed credentials (HS256).
#[derive(Clone)]
pub struct CredentialService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    user_ttl: Duration,
    admin_ttl: Duration,
}

impl std::fmt::Debug for CredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialService")
            .field("keys", &"[REDACTED]")
            .field("user_ttl", &self.user_ttl)
            .field("admin_ttl", &self.admin_ttl)
            .finish()
    }
}

impl CredentialService {
    /// Create a credential service from the signing secret.
    #[must_use]
    pub fn new(secret: &SecretString, tokens: &TokenConfig) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            user_ttl: tokens.user_ttl,
            admin_ttl: tokens.admin_ttl,
        }
    }

    const fn ttl(&self, principal: PrincipalType) -> Duration {
        match principal {
            PrincipalType::EndUser => self.user_ttl,
            PrincipalType::Admin => self.admin_ttl,
        }
    }

    /// Sign a credential for `principal`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Signing` if encoding fails.
    pub fn issue(
        &self,
        principal: PrincipalType,
        subject: i32,
        email: &Email,
    ) -> Result<IssuedCredential, CredentialError> {
        self.issue_at(principal, subject, email, Utc::now())
    }

    fn issue_at(
        &self,
        principal: PrincipalType,
        subject: i32,
        email: &Email,
        now: DateTime<Utc>,
    ) -> Result<IssuedCredential, CredentialError> {
        let expires_at = now + self.ttl(principal);
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            aud: principal.audience().to_string(),
            iss: ISSUER.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Signing(e.to_string()))?;

        Ok(IssuedCredential {
            token,
            principal,
            expires_at,
        })
    }

    /// Verify a token and check it was issued for `expected`.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Expired` for expired tokens,
    /// `CredentialError::WrongPrincipal` when the audience does not match,
    /// `CredentialError::Invalid` for anything else (bad signature, garbage).
    pub fn verify(&self, token: &str, expected: PrincipalType) -> Result<Claims, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[expected.audience()]);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                ErrorKind::InvalidAudience => CredentialError::WrongPrincipal,
                _ => CredentialError::Invalid(e.to_string()),
            }
        })?;

        Ok(data.claims)
    }
}
