// src/infra/errors.rs - Error types for callhint

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HintError {
    // Parsing user/config input into closed vocabularies
    #[error("Unknown hint category '{name}'")]
    UnknownCategory { name: String },

    #[error("Unknown trigger '{name}' (expected e.g. first_time_user or extended_usage:300)")]
    UnknownTrigger { name: String },

    #[error("Unknown proficiency level '{name}'")]
    UnknownLevel { name: String },

    #[error("Unknown outcome '{name}' (expected accepted or deferred)")]
    UnknownOutcome { name: String },

    #[error("Configuration error: {0}")]
    Config(String),

    // Engine task
    #[error("Hint engine is no longer running")]
    ChannelClosed,

    // Infra
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HintError {
    /// Errors caused by bad input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            HintError::UnknownCategory { .. }
                | HintError::UnknownTrigger { .. }
                | HintError::UnknownLevel { .. }
                | HintError::UnknownOutcome { .. }
                | HintError::Config(_)
        )
    }
}
