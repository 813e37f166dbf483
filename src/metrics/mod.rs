//! Prometheus metrics for the mailer.
//!
//! - Request outcomes of `POST /send-email`
//! - Rate limiting decisions and tracked clients
//! - Render and dispatch latency

mod helpers;

pub use helpers::{encode_metrics, DeliveryMetrics, RateLimitMetrics, RequestMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "mailer";

lazy_static! {
    // ============================================================================
    // Request Metrics
    // ============================================================================

    /// Send requests by outcome
    pub static ref REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_requests_total", METRIC_PREFIX),
        "Total send-email requests by outcome",
        &["outcome"]
    ).unwrap();

    // ============================================================================
    // Rate Limiting Metrics
    // ============================================================================

    pub static ref RATELIMIT_ALLOWED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_ratelimit_allowed_total", METRIC_PREFIX),
        "Total requests allowed by the rate limiter"
    ).unwrap();

    pub static ref RATELIMIT_DENIED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_ratelimit_denied_total", METRIC_PREFIX),
        "Total requests denied by the rate limiter"
    ).unwrap();

    /// Client identities with an open window
    pub static ref RATELIMIT_TRACKED_CLIENTS: IntGauge = register_int_gauge!(
        format!("{}_ratelimit_tracked_clients", METRIC_PREFIX),
        "Number of client identities currently tracked by the rate limiter"
    ).unwrap();

    /// Configured limiter settings, refreshed on scrape
    pub static ref RATELIMIT_ENABLED: IntGauge = register_int_gauge!(
        format!("{}_ratelimit_enabled", METRIC_PREFIX),
        "Whether the rate limit stage is enabled (1) or skipped (0)"
    ).unwrap();

    pub static ref RATELIMIT_MAX_REQUESTS: IntGauge = register_int_gauge!(
        format!("{}_ratelimit_max_requests", METRIC_PREFIX),
        "Requests allowed per client within one window"
    ).unwrap();

    pub static ref RATELIMIT_WINDOW_SECONDS: IntGauge = register_int_gauge!(
        format!("{}_ratelimit_window_seconds", METRIC_PREFIX),
        "Length of a rate limit window in seconds"
    ).unwrap();

    // ============================================================================
    // Delivery Metrics
    // ============================================================================

    pub static ref RENDER_DURATION: Histogram = register_histogram!(
        format!("{}_render_duration_seconds", METRIC_PREFIX),
        "Template load and render time in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    ).unwrap();

    pub static ref DISPATCH_DURATION: Histogram = register_histogram!(
        format!("{}_dispatch_duration_seconds", METRIC_PREFIX),
        "Mail transport hand-off time in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    ).unwrap();
}
