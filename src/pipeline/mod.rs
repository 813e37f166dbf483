//! The send pipeline.
//!
//! A request runs through a configurable, ordered list of named stages:
//! `authenticate`, `rate_limit`, `validate`, `render`, `dispatch`. The first
//! failing stage ends the request. The order is checked once at startup.

mod runner;
mod stage;

pub use runner::{Pipeline, PipelineOutcome, SendInput};
pub use stage::{PipelineError, Stage};
