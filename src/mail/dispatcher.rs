use std::sync::Arc;

use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Address, Message};
use thiserror::Error;
use uuid::Uuid;

use super::transport::MailTransport;
use crate::config::MailConfig;
use crate::email::{DeliveryResult, RenderedMessage};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("mail transport misconfigured: {0}")]
    Config(String),

    /// Connection, authentication or recipient rejection reported by the transport
    #[error("{0}")]
    Transport(String),
}

/// Composes messages with a fixed sender and sends them through one transport
pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    from: Mailbox,
}

impl MailDispatcher {
    pub fn new(config: &MailConfig, transport: Arc<dyn MailTransport>) -> Result<Self, DispatchError> {
        let sender = config.sender_address();
        let address: Address = sender
            .parse()
            .map_err(|source| DispatchError::InvalidAddress {
                address: sender.clone(),
                source,
            })?;

        let name = Some(config.from_name.clone()).filter(|n| !n.is_empty());

        Ok(Self {
            transport,
            from: Mailbox::new(name, address),
        })
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Build the message and attempt delivery once.
    ///
    /// The returned identifier is the `Message-ID` header set on the message.
    #[tracing::instrument(name = "mail.send", skip(self, message), fields(transport = self.transport.name()))]
    pub async fn send(&self, message: &RenderedMessage) -> Result<DeliveryResult, DispatchError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|source| DispatchError::InvalidAddress {
                address: message.to.clone(),
                source,
            })?;

        let message_id = format!("<{}@{}>", Uuid::new_v4(), self.from.email.domain());

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_HTML)
            .body(message.html.clone())?;

        self.transport.send(email).await?;

        tracing::info!(message_id = %message_id, "Email handed to transport");
        Ok(DeliveryResult { message_id })
    }
}
