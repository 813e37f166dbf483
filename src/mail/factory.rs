//! Factory for creating the configured mail transport

use std::sync::Arc;

use super::dispatcher::DispatchError;
use super::transport::{LogMailTransport, MailTransport, MemoryMailTransport, SmtpMailTransport};
use crate::config::{MailConfig, MailTransportKind};

/// Create the transport selected by `mail.transport`
pub fn create_mail_transport(config: &MailConfig) -> Result<Arc<dyn MailTransport>, DispatchError> {
    let transport: Arc<dyn MailTransport> = match config.transport {
        MailTransportKind::Smtp => Arc::new(SmtpMailTransport::from_config(config)?),
        MailTransportKind::Log => {
            tracing::warn!("Mail transport is 'log'; emails will not be delivered");
            Arc::new(LogMailTransport)
        }
        MailTransportKind::Memory => Arc::new(MemoryMailTransport::new()),
    };

    Ok(transport)
}
