//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    DISPATCH_DURATION, RATELIMIT_ALLOWED_TOTAL, RATELIMIT_DENIED_TOTAL,
    RATELIMIT_ENABLED, RATELIMIT_MAX_REQUESTS, RATELIMIT_TRACKED_CLIENTS,
    RATELIMIT_WINDOW_SECONDS, RENDER_DURATION, REQUESTS_TOTAL,
};
use crate::ratelimit::RateLimiterStats;

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording request outcomes
pub struct RequestMetrics;

impl RequestMetrics {
    pub fn record_sent() {
        REQUESTS_TOTAL.with_label_values(&["sent"]).inc();
    }

    /// Record a failed request under its outcome label
    pub fn record_failed(outcome: &str) {
        REQUESTS_TOTAL.with_label_values(&[outcome]).inc();
    }
}

/// Helper struct for recording rate limit metrics
pub struct RateLimitMetrics;

impl RateLimitMetrics {
    pub fn record_allowed() {
        RATELIMIT_ALLOWED_TOTAL.inc();
    }

    pub fn record_denied() {
        RATELIMIT_DENIED_TOTAL.inc();
    }

    pub fn set_tracked_clients(count: usize) {
        RATELIMIT_TRACKED_CLIENTS.set(count as i64);
    }

    /// Publish a limiter snapshot: tracked clients plus its settings
    pub fn record_stats(stats: &RateLimiterStats) {
        Self::set_tracked_clients(stats.tracked_clients);
        RATELIMIT_ENABLED.set(i64::from(stats.enabled));
        RATELIMIT_MAX_REQUESTS.set(i64::from(stats.max_requests));
        RATELIMIT_WINDOW_SECONDS.set(i64::try_from(stats.window_seconds).unwrap_or(i64::MAX));
    }
}

/// Helper struct for recording render and dispatch latency
pub struct DeliveryMetrics;

impl DeliveryMetrics {
    pub fn observe_render(elapsed: Duration) {
        RENDER_DURATION.observe(elapsed.as_secs_f64());
    }

    pub fn observe_dispatch(elapsed: Duration) {
        DISPATCH_DURATION.observe(elapsed.as_secs_f64());
    }
}
