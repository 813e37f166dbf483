//! `POST /send-email`

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::email::SendEmailResponse;
use crate::metrics::RequestMetrics;
use crate::pipeline::SendInput;
use crate::ratelimit::RateLimitResult;
use crate::server::{client_identity, AppState};

/// Run the send pipeline for one request
#[tracing::instrument(
    name = "http.send_email",
    skip_all,
    fields(client_ip = tracing::field::Empty)
)]
pub async fn send_email(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let client_ip = client_identity(&state.settings.rate_limit, &headers, peer);
    tracing::Span::current().record("client_ip", tracing::field::display(client_ip));

    let outcome = state
        .pipeline
        .run(SendInput {
            headers: &headers,
            client_ip,
            body: &body,
        })
        .await;

    let mut response = match outcome.result {
        Ok(delivery) => {
            RequestMetrics::record_sent();
            Json(SendEmailResponse::sent(delivery)).into_response()
        }
        Err(e) => {
            RequestMetrics::record_failed(e.outcome());
            e.into_response()
        }
    };

    if let Some(decision) = &outcome.rate_limit {
        apply_rate_limit_headers(response.headers_mut(), decision);
    }

    response
}

/// Add X-RateLimit-* headers describing the client's current window
fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitResult) {
    let (limit, remaining, reset) = match decision {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset_after,
        } => (*limit, *remaining, *reset_after),
        RateLimitResult::Denied { retry_after, limit } => (*limit, 0, *retry_after),
    };

    if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
        headers.insert("X-RateLimit-Limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("X-RateLimit-Remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&reset.to_string()) {
        headers.insert("X-RateLimit-Reset", v);
    }
}
