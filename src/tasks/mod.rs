//! Background tasks.

mod ratelimit_cleanup;

pub use ratelimit_cleanup::RateLimitCleanupTask;
