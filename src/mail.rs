//!
//! # Mail Transport
//!
//! Outbound mail behind a small backend trait so handlers never talk to SMTP
//! directly. Three implementations:
//!
//! - [`SmtpMailer`]: production delivery over `lettre`'s async SMTP transport.
//! - [`ConsoleMailer`]: development backend that writes the message to the log.
//! - [`MemoryMailer`]: in-memory outbox for tests.
//!
//! The backend is selected from [`Config`] at startup and shared through
//! `web::Data<dyn MailBackend>`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::Config;
use crate::error::AppError;

/// A plain-text outbound message.
#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailBackend: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<(), AppError>;
}

/// Delivers mail over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Upstream(format!("invalid SMTP relay: {}", e)))?
            .port(config.smtp_port);
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.from_email.clone(),
        })
    }
}

#[async_trait]
impl MailBackend for SmtpMailer {
    async fn send(&self, mail: &Mail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| AppError::Upstream(format!("invalid sender address: {}", e)))?,
            )
            .to(mail
                .to
                .parse()
                .map_err(|e| AppError::Upstream(format!("invalid recipient address: {}", e)))?)
            .subject(&mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| AppError::Upstream(format!("failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Upstream(format!("SMTP send failed: {}", e)))?;
        Ok(())
    }
}

/// Writes the message to the log instead of sending it. Default backend.
pub struct ConsoleMailer;

#[async_trait]
impl MailBackend for ConsoleMailer {
    async fn send(&self, mail: &Mail) -> Result<(), AppError> {
        log::info!(
            "mail to <{}> subject {:?}: {}",
            mail.to,
            mail.subject,
            mail.body
        );
        Ok(())
    }
}

/// Records messages in an in-process outbox. Used by tests to assert on
/// dispatched mail without a transport.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<Mail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailBackend for MemoryMailer {
    async fn send(&self, mail: &Mail) -> Result<(), AppError> {
        self.outbox.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Builds the mail backend named by `MAIL_BACKEND` ("smtp" or "console").
pub fn backend_from_config(config: &Config) -> Result<Arc<dyn MailBackend>, AppError> {
    match config.mail_backend.as_str() {
        "smtp" => Ok(Arc::new(SmtpMailer::new(config)?)),
        "console" => Ok(Arc::new(ConsoleMailer)),
        other => Err(AppError::Internal(format!(
            "unknown mail backend {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn test_memory_mailer_records_messages() {
        let mailer = MemoryMailer::new();
        let mail = Mail {
            to: "user@example.com".into(),
            subject: "Password Reset Request".into(),
            body: "Click the link".into(),
        };
        mailer.send(&mail).await.unwrap();

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "user@example.com");
        assert_eq!(sent[0].subject, "Password Reset Request");
    }

    #[actix_rt::test]
    async fn test_console_mailer_always_succeeds() {
        let mailer = ConsoleMailer;
        let mail = Mail {
            to: "user@example.com".into(),
            subject: "hello".into(),
            body: "body".into(),
        };
        assert!(mailer.send(&mail).await.is_ok());
    }
}
