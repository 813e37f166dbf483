//! Template error definitions

use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid template name \"{0}\"")]
    InvalidName(String),

    #[error("template \"{0}\" not found")]
    NotFound(String),

    #[error("failed to read template \"{name}\": {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render template \"{name}\": {source}")]
    Render {
        name: String,
        #[source]
        source: handlebars::RenderError,
    },
}

/// Result type for template operations
pub type RenderResult<T> = Result<T, RenderError>;
