//! Outbound mail delivery.
//!
//! The [`MailDispatcher`] builds a message with the configured sender and
//! hands it to a [`MailTransport`] exactly once. There is no retry and no queue.

mod dispatcher;
mod factory;
mod transport;

pub use dispatcher::{DispatchError, MailDispatcher};
pub use factory::create_mail_transport;
pub use transport::{LogMailTransport, MailTransport, MemoryMailTransport, SentMail, SmtpMailTransport};
