//! Shared-secret API key authentication.

mod api_key;

pub use api_key::{ApiKeyAuthenticator, AuthError};
