//! Outgoing mail
//!
//! [`SmtpMailer`] submits plain-text messages to an authenticated STARTTLS
//! relay. [`LogMailer`] only logs them and is used when mail is disabled.

use std::time::Duration;

use axum::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::error::{AppError, AppResult};

/// A rendered plain-text email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

/// SMTP submission through lettre's tokio transport
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> AppResult<Self> {
        let from = config.from_address.parse::<Mailbox>().map_err(|e| {
            AppError::Internal(format!("Invalid sender address '{}': {}", config.from_address, e))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Internal(format!("Invalid SMTP relay: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|e| AppError::InvalidInput(format!("Invalid recipient '{}': {}", message.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(message.body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("SMTP delivery failed: {}", e)))?;

        Ok(())
    }
}

/// Logs messages instead of sending them
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Mail delivery disabled, message not sent"
        );
        tracing::debug!(body = %message.body, "Unsent message body");
        Ok(())
    }
}
