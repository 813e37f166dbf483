//! Liveness endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// GET / - liveness only
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "Email API running".to_string(),
    })
}
