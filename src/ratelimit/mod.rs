//! Per-client rate limiting using fixed time windows.
//!
//! Every client identity (source IP) owns a counter and a window start.
//! The counter resets entirely once the window elapses; it is not rolled
//! back when a later pipeline stage rejects the request.

mod config;
mod limiter;
mod window;

pub use config::RateLimitConfig;
pub use limiter::{RateLimitError, RateLimitResult, RateLimiter, RateLimiterStats};
pub use window::FixedWindow;
