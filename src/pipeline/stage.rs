use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One step of the send pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Authenticate,
    RateLimit,
    Validate,
    Render,
    Dispatch,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Authenticate,
        Stage::RateLimit,
        Stage::Validate,
        Stage::Render,
        Stage::Dispatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Authenticate => "authenticate",
            Stage::RateLimit => "rate_limit",
            Stage::Validate => "validate",
            Stage::Render => "render",
            Stage::Dispatch => "dispatch",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| PipelineError::UnknownStage(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("unknown pipeline stage '{0}'")]
    UnknownStage(String),

    #[error("pipeline stage '{0}' is listed more than once")]
    DuplicateStage(Stage),

    #[error("pipeline stage '{0}' is missing")]
    MissingStage(Stage),

    #[error("pipeline stage '{before}' must run before '{after}'")]
    OutOfOrder { before: Stage, after: Stage },

    #[error("pipeline stage '{stage}' ran without the output of '{needs}'")]
    MissingInput { stage: Stage, needs: Stage },
}

/// Check that `stages` holds every stage once, that data producers
/// precede their consumers and that nothing runs after dispatch.
pub(crate) fn check_order(stages: &[Stage]) -> Result<(), PipelineError> {
    for (i, stage) in stages.iter().enumerate() {
        if stages[..i].contains(stage) {
            return Err(PipelineError::DuplicateStage(*stage));
        }
    }

    for stage in Stage::ALL {
        if !stages.contains(&stage) {
            return Err(PipelineError::MissingStage(stage));
        }
    }

    let position = |stage: Stage| stages.iter().position(|s| *s == stage);
    // Policy stages may go anywhere ahead of delivery
    for (before, after) in [
        (Stage::Validate, Stage::Render),
        (Stage::Render, Stage::Dispatch),
        (Stage::Authenticate, Stage::Dispatch),
        (Stage::RateLimit, Stage::Dispatch),
    ] {
        if position(before) > position(after) {
            return Err(PipelineError::OutOfOrder { before, after });
        }
    }

    Ok(())
}
