use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::root;
use super::metrics::prometheus_metrics;
use super::send::send_email;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Liveness
        .route("/", get(root))
        .route("/metrics", get(prometheus_metrics))
        // Mail
        .route("/send-email", post(send_email))
}
