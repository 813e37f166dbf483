//! Request and message types shared by the send pipeline.

mod types;

pub use types::{DeliveryResult, RenderedMessage, SendEmailRequest, SendEmailResponse};
