use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::config::is_production;
use crate::mail::DispatchError;
use crate::pipeline::PipelineError;
use crate::ratelimit::RateLimitError;
use crate::template::RenderError;
use crate::validation::{FieldError, ValidationErrors};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error(transparent)]
    RateLimited(#[from] RateLimitError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    /// Metric label for the request outcome this error produces
    pub fn outcome(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "unauthorized",
            AppError::RateLimited(_) => "rate_limited",
            AppError::Validation(_) => "invalid",
            AppError::Render(_) => "render_failed",
            AppError::Dispatch(_) => "dispatch_failed",
            AppError::Config(_) | AppError::Pipeline(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }
}

/// Client-facing text for a failed send. Production hides the cause.
fn send_failure(log_message: &str) -> String {
    if is_production() {
        "Failed to send email: internal error".to_string()
    } else {
        format!("Failed to send email: {}", log_message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let log_message = self.to_string();

        let (status, body, retry_after) = match self {
            AppError::Auth(_) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("Unauthorized"),
                None,
            ),
            AppError::RateLimited(RateLimitError::Exceeded { retry_after }) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorResponse::new(log_message.clone()),
                Some(retry_after),
            ),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation failed".to_string(),
                    details: Some(errors.0),
                },
                None,
            ),
            AppError::Render(_)
            | AppError::Dispatch(_)
            | AppError::Config(_)
            | AppError::Pipeline(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(send_failure(&log_message)),
                None,
            ),
        };

        // Always log the detailed error server-side
        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), message = %log_message, "Send email failed");
        } else {
            tracing::warn!(status = %status.as_u16(), message = %log_message, "Send email rejected");
        }

        let mut response = (status, Json(body)).into_response();
        if let Some(retry_after) = retry_after {
            if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", v);
            }
        }

        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
