//! Fixed window counter

use std::time::{Duration, Instant};

/// Request counter for a single client identity.
///
/// The window starts at the first request and lasts a fixed duration.
/// Once it has elapsed the next hit opens a fresh window with a zero count.
#[derive(Debug, Clone)]
pub struct FixedWindow {
    /// When the current window opened
    started_at: Instant,
    /// Hits recorded in the current window
    count: u32,
}

impl FixedWindow {
    /// Open an empty window at `now`
    pub fn new(now: Instant) -> Self {
        Self {
            started_at: now,
            count: 0,
        }
    }

    /// Record one hit at `now`, opening a new window first if the current one elapsed.
    /// Returns the count inside the (possibly new) window.
    pub fn hit(&mut self, now: Instant, window: Duration) -> u32 {
        if self.is_expired(now, window) {
            self.started_at = now;
            self.count = 0;
        }
        self.count = self.count.saturating_add(1);
        self.count
    }

    /// Whether the window has fully elapsed at `now`
    pub fn is_expired(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.started_at) >= window
    }

    /// Whole seconds until the window resets, rounded up
    pub fn reset_after(&self, now: Instant, window: Duration) -> u64 {
        let left = window.saturating_sub(now.saturating_duration_since(self.started_at));
        left.as_secs() + u64::from(left.subsec_nanos() > 0)
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
