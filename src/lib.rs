// Shared components
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Send pipeline
pub mod email;
pub mod mail;
pub mod pipeline;
pub mod ratelimit;
pub mod template;
pub mod validation;

// Application layer
pub mod api;
pub mod server;

// Supporting modules
pub mod tasks;
