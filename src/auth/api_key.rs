use axum::http::{HeaderMap, HeaderName};
use config::ConfigError;
use thiserror::Error;

use crate::config::ApiConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing API key header")]
    MissingKey,

    #[error("invalid API key")]
    InvalidKey,
}

/// Checks a request header against a single configured secret.
#[derive(Debug, Clone)]
pub struct ApiKeyAuthenticator {
    header: HeaderName,
    secret: Option<String>,
}

impl ApiKeyAuthenticator {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(config.key_header.trim().as_bytes()).map_err(|e| {
            ConfigError::Message(format!(
                "api.key_header '{}' is not a valid header name: {}",
                config.key_header, e
            ))
        })?;

        Ok(Self {
            header,
            secret: config.secret().map(str::to_string),
        })
    }

    /// Whether a secret is configured. Without one every request is allowed.
    pub fn is_enforced(&self) -> bool {
        self.secret.is_some()
    }

    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        // If no API key is configured, allow all requests (development mode)
        let Some(expected) = &self.secret else {
            return Ok(());
        };

        let provided = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok());

        match provided {
            Some(key) if key == expected => Ok(()),
            Some(_) => {
                tracing::warn!(header = %self.header, "Invalid API key provided");
                Err(AuthError::InvalidKey)
            }
            None => {
                tracing::warn!(header = %self.header, "Missing API key header");
                Err(AuthError::MissingKey)
            }
        }
    }
}
