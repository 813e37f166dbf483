//! In-memory fixed window rate limiter

use std::net::IpAddr;
use std::time::Instant;

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;

use super::config::RateLimitConfig;
use super::window::FixedWindow;

/// Rejection raised by the rate limit stage
#[derive(Debug, Clone, Error)]
pub enum RateLimitError {
    #[error("Too many requests, please try again later")]
    Exceeded { retry_after: u64 },
}

/// Result of a rate limit check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets
        reset_after: u64,
    },
    /// Request is denied due to rate limiting
    Denied {
        retry_after: u64,
        limit: u32,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }

    /// Convert into the pipeline's allow/reject outcome
    pub fn into_result(self) -> Result<(), RateLimitError> {
        match self {
            RateLimitResult::Allowed { .. } => Ok(()),
            RateLimitResult::Denied { retry_after, .. } => {
                Err(RateLimitError::Exceeded { retry_after })
            }
        }
    }
}

/// Owns the per-client counters. Shared through `AppState`.
pub struct RateLimiter {
    windows: DashMap<IpAddr, FixedWindow>,
    config: RateLimitConfig,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
        }
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Count a request from `ip` and decide whether it may proceed.
    pub fn check(&self, ip: IpAddr) -> RateLimitResult {
        self.check_at(ip, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> RateLimitResult {
        let limit = self.config.max_requests;

        if !self.config.enabled {
            return RateLimitResult::Allowed {
                remaining: u32::MAX,
                limit: 0,
                reset_after: 0,
            };
        }

        let window = self.config.window();
        let mut entry = self
            .windows
            .entry(ip)
            .or_insert_with(|| FixedWindow::new(now));

        let count = entry.hit(now, window);
        let reset_after = entry.reset_after(now, window);

        if count <= limit {
            RateLimitResult::Allowed {
                remaining: limit - count,
                limit,
                reset_after,
            }
        } else {
            RateLimitResult::Denied {
                retry_after: reset_after.max(1),
                limit,
            }
        }
    }

    /// Drop clients whose window has elapsed
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub fn cleanup_expired_at(&self, now: Instant) -> usize {
        let window = self.config.window();
        let before = self.windows.len();

        self.windows.retain(|_, entry| !entry.is_expired(now, window));

        let removed = before.saturating_sub(self.windows.len());
        if removed > 0 {
            tracing::debug!(
                removed = removed,
                tracked = self.windows.len(),
                "Cleaned up expired rate limit windows"
            );
        }

        removed
    }

    /// Number of client identities currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Get statistics about the rate limiter
    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            enabled: self.config.enabled,
            tracked_clients: self.windows.len(),
            max_requests: self.config.max_requests,
            window_seconds: self.config.window_seconds,
        }
    }
}

/// Statistics about the rate limiter
#[derive(Debug, Clone, Serialize)]
pub struct RateLimiterStats {
    pub enabled: bool,
    pub tracked_clients: usize,
    pub max_requests: u32,
    pub window_seconds: u64,
}
