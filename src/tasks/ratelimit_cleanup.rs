use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::metrics::RateLimitMetrics;
use crate::ratelimit::RateLimiter;

/// Background task that evicts rate limit windows once they have elapsed
pub struct RateLimitCleanupTask {
    rate_limiter: Arc<RateLimiter>,
    interval: Duration,
    shutdown: broadcast::Receiver<()>,
}

impl RateLimitCleanupTask {
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        interval: Duration,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            rate_limiter,
            interval,
            shutdown,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(mut self) {
        let mut cleanup_timer = tokio::time::interval(self.interval);

        // Skip immediate first tick
        cleanup_timer.tick().await;

        tracing::info!(
            cleanup_interval_ms = self.interval.as_millis() as u64,
            "Rate limit cleanup task started"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!("Rate limit cleanup task received shutdown signal");
                    break;
                }
                _ = cleanup_timer.tick() => {
                    self.cleanup();
                }
            }
        }

        tracing::info!("Rate limit cleanup task stopped");
    }

    fn cleanup(&self) {
        let removed = self.rate_limiter.cleanup_expired();
        let tracked = self.rate_limiter.tracked_clients();
        RateLimitMetrics::set_tracked_clients(tracked);

        if removed > 0 {
            tracing::info!(
                removed = removed,
                tracked = tracked,
                "Evicted expired rate limit windows"
            );
        }
    }
}
