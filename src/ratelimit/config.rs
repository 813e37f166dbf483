//! Rate limiting configuration

use std::time::Duration;

use serde::Deserialize;

/// Configuration for rate limiting
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Length of a counting window in seconds
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
    /// Requests allowed per client within one window
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Interval between sweeps of expired windows, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
    /// Identify clients by the first X-Forwarded-For entry instead of the peer address
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_window_seconds() -> u64 {
    15 * 60 // 15 minutes
}

fn default_max_requests() -> u32 {
    100 // 100 requests per IP per window
}

fn default_cleanup_interval() -> u64 {
    60 // Sweep every minute
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds.max(1))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            window_seconds: default_window_seconds(),
            max_requests: default_max_requests(),
            cleanup_interval_seconds: default_cleanup_interval(),
            trust_forwarded_for: false,
        }
    }
}
