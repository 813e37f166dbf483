use serde::{Deserialize, Serialize};

/// A validated request to send a templated email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendEmailRequest {
    /// Recipient address
    pub to: String,
    pub subject: String,
    /// Template name, resolved against the template directory at render time
    pub template: String,
    /// Values exposed to the template
    #[serde(default)]
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Fully rendered message ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Opaque identifier of a handed-off message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResult {
    pub message_id: String,
}

/// Body returned by `POST /send-email` on success
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailResponse {
    pub message: String,
    pub message_id: String,
}

impl SendEmailResponse {
    pub fn sent(delivery: DeliveryResult) -> Self {
        Self {
            message: "Email sent".to_string(),
            message_id: delivery.message_id,
        }
    }
}
