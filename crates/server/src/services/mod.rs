//! Business logic services.

pub mod auth;
pub mod credential;
pub mod email;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use credential::{Claims, CredentialError, CredentialService, IssuedCredential};
pub use email::{EmailError, EmailService};
pub use uploads::{UploadError, UploadService};
