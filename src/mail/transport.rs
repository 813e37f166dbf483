//! Transport implementations behind [`MailTransport`].

use std::time::Duration;

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tokio::sync::Mutex;

use super::dispatcher::DispatchError;
use crate::config::{MailConfig, TlsMode};

/// Hands a built message to an outbound system.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `message`. Called once per request, never retried.
    async fn send(&self, message: Message) -> Result<(), DispatchError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// SMTP relay configured once at startup
pub struct SmtpMailTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    pub fn from_config(config: &MailConfig) -> Result<Self, DispatchError> {
        let tls = match config.tls {
            TlsMode::None => Tls::None,
            TlsMode::Opportunistic => Tls::Opportunistic(tls_parameters(&config.host)?),
            TlsMode::StartTls => Tls::Required(tls_parameters(&config.host)?),
            TlsMode::Tls => Tls::Wrapper(tls_parameters(&config.host)?),
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(config.timeout_seconds)));

        // Add credentials if provided
        if let Some(username) = config.username.as_deref().filter(|u| !u.is_empty()) {
            let password = config.password.clone().unwrap_or_default();
            builder = builder.credentials(Credentials::new(username.to_string(), password));
        }

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            inner: builder.build(),
        })
    }
}

fn tls_parameters(host: &str) -> Result<TlsParameters, DispatchError> {
    TlsParameters::new(host.to_string()).map_err(|e| DispatchError::Config(e.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, message: Message) -> Result<(), DispatchError> {
        let response = self
            .inner
            .send(message)
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))?;

        tracing::debug!(code = ?response.code(), "SMTP server accepted message");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// Logs the envelope and drops the message. For local development.
#[derive(Debug, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, message: Message) -> Result<(), DispatchError> {
        let envelope = message.envelope();
        let recipients: Vec<String> = envelope.to().iter().map(ToString::to_string).collect();

        tracing::info!(
            from = ?envelope.from().map(ToString::to_string),
            to = ?recipients,
            bytes = message.formatted().len(),
            "Mail transport is 'log'; message not delivered"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// A message captured by [`MemoryMailTransport`]
#[derive(Debug, Clone)]
pub struct SentMail {
    pub from: Option<String>,
    pub to: Vec<String>,
    /// Full RFC 5322 text
    pub raw: String,
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct MemoryMailTransport {
    sent: Mutex<Vec<SentMail>>,
}

impl MemoryMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of messages sent so far
    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MailTransport for MemoryMailTransport {
    async fn send(&self, message: Message) -> Result<(), DispatchError> {
        let envelope = message.envelope();
        let mail = SentMail {
            from: envelope.from().map(ToString::to_string),
            to: envelope.to().iter().map(ToString::to_string).collect(),
            raw: String::from_utf8_lossy(&message.formatted()).into_owned(),
        };
        self.sent.lock().await.push(mail);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
