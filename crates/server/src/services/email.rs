//! Email service for password-reset links.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. When SMTP is
//! not configured the service runs in development mode and logs the message
//! instead of sending it.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use mff_core::Email;

use crate::config::EmailConfig;

/// HTML template for the password-reset email.
#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    reset_url: &'a str,
    expires_minutes: i64,
}

/// Plain text template for the password-reset email.
#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    reset_url: &'a str,
    expires_minutes: i64,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Clone)]
struct SmtpSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    smtp: Option<SmtpSender>,
}

impl EmailService {
    /// Create an email service; `None` config means development mode.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            smtp: Some(SmtpSender {
                mailer,
                from_address: config.from_address.clone(),
            }),
        })
    }

    /// An email service that only logs.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { smtp: None }
    }

    /// Whether messages are actually delivered.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.smtp.is_some()
    }

    /// Send a password-reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &Email,
        reset_url: &str,
        expires_minutes: i64,
    ) -> Result<(), EmailError> {
        let Some(smtp) = &self.smtp else {
            tracing::warn!(
                to = %to,
                reset_url = %reset_url,
                "SMTP not configured; password reset link not sent"
            );
            return Ok(());
        };

        let html = PasswordResetEmailHtml {
            reset_url,
            expires_minutes,
        }
        .render()?;
        let text = PasswordResetEmailText {
            reset_url,
            expires_minutes,
        }
        .render()?;

        smtp.send_multipart_email(
            to.as_str(),
            "Reset your Music For Funerals password",
            &text,
            &html,
        )
        .await
    }
}

impl SmtpSender {
    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_templates_include_link() {
        let url = "https://mff.test/reset-password?token=abc123";
        let html = PasswordResetEmailHtml {
            reset_url: url,
            expires_minutes: 60,
        }
        .render()
        .unwrap();
        let text = PasswordResetEmailText {
            reset_url: url,
            expires_minutes: 60,
        }
        .render()
        .unwrap();

        assert!(html.contains("token=abc123"));
        assert!(text.contains(url));
        assert!(text.contains("60 minutes"));
    }

    #[tokio::test]
    async fn test_disabled_service_logs_instead_of_sending() {
        let service = EmailService::new(None).unwrap();
        assert!(!service.is_enabled());

        let to = Email::parse("family@mff.test").unwrap();
        service
            .send_password_reset(&to, "http://localhost/reset-password?token=x", 60)
            .await
            .unwrap();
    }
}
