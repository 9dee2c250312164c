//! Outbound email over SMTP.

use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;

use attire_core::Email;

use crate::config::EmailConfig;

/// Errors from building or sending mail.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Sends transactional mail through the configured SMTP relay.
#[derive(Clone)]
pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailService {
    /// Build a service from the SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the relay host or from-address is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_owned(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from_address.parse()?,
        })
    }

    /// Send a verification code.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message can't be built or delivered.
    pub async fn send_otp(&self, to: &Email, code: &str) -> Result<(), EmailError> {
        self.send(to, "Your verification code", &otp_body(code))
            .await
    }

    /// Send the newsletter welcome message.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message can't be built or delivered.
    pub async fn send_subscription_welcome(&self, to: &Email) -> Result<(), EmailError> {
        self.send(to, "Welcome to the Attire newsletter", &welcome_body())
            .await
    }

    /// Send the welcome message without blocking the caller, logging on
    /// failure.
    pub fn send_subscription_welcome_background(&self, to: Email) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(error) = service.send_subscription_welcome(&to).await {
                tracing::warn!(%error, email = %to, "failed to send welcome email");
            }
        });
    }

    async fn send(&self, to: &Email, subject: &str, body: &str) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.as_str().parse()?)
            .subject(subject)
            .body(body.to_owned())?;

        self.transport.send(message).await?;
        Ok(())
    }
}

fn otp_body(code: &str) -> String {
    format!(
        "Your verification code is {code}.\n\n\
         It expires in 10 minutes. If you didn't request this code, you can \
         ignore this email.\n"
    )
}

fn welcome_body() -> String {
    "Thanks for subscribing to the Attire newsletter!\n\n\
     You'll be the first to hear about new arrivals and offers.\n"
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_body_contains_code_and_expiry() {
        let body = otp_body("482913");
        assert!(body.contains("482913"));
        assert!(body.contains("10 minutes"));
    }
}
