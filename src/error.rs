//! Error types for brand-gen.

use std::time::Duration;

use crate::brand::state::{Stage, StageState};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {after:?}")]
    Timeout { provider: String, after: Duration },
}

/// Workflow errors raised by the stage engine, selection handler and
/// profile assembler.
///
/// Recoverable variants leave `stage_state` untouched so the menu on screen
/// stays actionable. Fatal variants tear the session down.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("Missing required context: {field}")]
    MissingContext { field: &'static str },

    #[error("Generation failed for {target}: {reason}")]
    GenerationFailed { target: String, reason: String },

    #[error("Invalid selection {index}: {available} options available")]
    InvalidSelection { index: usize, available: usize },

    #[error("Action {action} not allowed in state {state}")]
    StateMismatch { action: String, state: StageState },

    #[error("Custom input received but no stage is waiting for it")]
    PendingStageMissing,

    #[error("Selections incomplete, missing: {missing:?}")]
    IncompleteSelections { missing: Vec<Stage> },

    #[error("Custom input is empty")]
    EmptyInput,
}

impl FlowError {
    pub fn state_mismatch(action: impl Into<String>, state: StageState) -> Self {
        Self::StateMismatch {
            action: action.into(),
            state,
        }
    }

    /// Fatal errors clear the session and force a restart from the seed concept.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingContext { .. } | Self::PendingStageMissing | Self::IncompleteSelections { .. }
        )
    }

    /// Stable snake_case identifier for wire payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingContext { .. } => "missing_context",
            Self::GenerationFailed { .. } => "generation_failed",
            Self::InvalidSelection { .. } => "invalid_selection",
            Self::StateMismatch { .. } => "state_mismatch",
            Self::PendingStageMissing => "pending_stage_missing",
            Self::IncompleteSelections { .. } => "incomplete_selections",
            Self::EmptyInput => "empty_input",
        }
    }

    /// Short human-readable notice shown to the user.
    pub fn user_notice(&self) -> String {
        match self {
            Self::MissingContext { .. } => {
                "❌ Could not find the original concept. Please start over.".to_string()
            }
            Self::GenerationFailed { target, .. } => {
                format!("❌ Failed to generate {target}. Please try again.")
            }
            Self::InvalidSelection { .. } => {
                "❌ That option is not available. Pick one from the menu.".to_string()
            }
            Self::StateMismatch { .. } => {
                "❌ That action is not available right now. Please try again.".to_string()
            }
            Self::PendingStageMissing => {
                "❌ Error: no stage is waiting for your option. Please start over.".to_string()
            }
            Self::IncompleteSelections { .. } => {
                "❌ Something went wrong assembling the project. Please start over.".to_string()
            }
            Self::EmptyInput => {
                "✏️ Your option can't be empty. Type it again:".to_string()
            }
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
