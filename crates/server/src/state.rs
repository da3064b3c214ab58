//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ServerConfig;
use crate::services::{CredentialService, EmailService, UploadService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    credentials: CredentialService,
    email: EmailService,
    uploads: UploadService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay cannot be configured.
    pub fn new(
        config: ServerConfig,
        pool: PgPool,
    ) -> Result<Self, lettre::transport::smtp::Error> {
        let email = EmailService::new(config.email.as_ref())?;
        Ok(Self::with_email(config, pool, email))
    }

    /// Create a state with an explicit email service.
    #[must_use]
    pub fn with_email(config: ServerConfig, pool: PgPool, email: EmailService) -> Self {
        let credentials = CredentialService::new(&config.session_secret, &config.tokens);
        let uploads = UploadService::new(config.upload_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                credentials,
                email,
                uploads,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Credential issuer/verifier for both customers and admins.
    #[must_use]
    pub fn credentials(&self) -> &CredentialService {
        &self.inner.credentials
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadService {
        &self.inner.uploads
    }
}
