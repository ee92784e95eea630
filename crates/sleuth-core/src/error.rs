//! Error types for the sleuth core.

use std::path::PathBuf;

/// Sleuth errors.
///
/// Every variant is fatal to a run once it reaches the investigation loop.
/// Retrying happens below this level (completion client, retry controller).
#[derive(Debug, thiserror::Error)]
pub enum SleuthError {
    /// Case bundle file missing or violating its schema. Never retried.
    #[error("case error in {}: {message}", path.display())]
    Case { path: PathBuf, message: String },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Connection-level failure, after linear-backoff retries.
    #[error("transport failure after {attempts} attempt(s): {message}")]
    Transport { attempts: u32, message: String },

    /// Endpoint kept answering with a non-success status.
    #[error("the system is not available: HTTP {status} after {attempts} attempt(s): {body}")]
    Unavailable {
        status: u16,
        attempts: u32,
        body: String,
    },

    /// A 2xx response that carried no completion text.
    #[error("invalid completion response: {message}")]
    InvalidResponse { message: String },

    /// Retry-until-valid budget spent without an accepted response.
    #[error("failed to get a valid {what} after {attempts} attempt(s)")]
    ValidationExhausted {
        what: String,
        attempts: u32,
        last_response: Option<String>,
    },

    /// File-exchange debug mode failure.
    #[error("file exchange error: {message}")]
    Exchange { message: String },

    /// Writing the result artifact failed.
    #[error("report error: {message}")]
    Report { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SleuthError {
    pub fn case(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Case {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            // Bad input: fix the bundle or the environment and rerun
            Self::Case { .. } => 2,
            Self::Config { .. } => 2,

            // Remote side
            Self::Transport { .. } => 1,
            Self::Unavailable { .. } => 1,
            Self::InvalidResponse { .. } => 1,
            Self::ValidationExhausted { .. } => 1,

            // Local I/O
            Self::Exchange { .. } => 1,
            Self::Report { .. } => 1,
            Self::Io(_) => 1,
            Self::Json(_) => 1,
        }
    }

    /// Whether a completion client may retry the failed call.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Unavailable { .. })
    }
}

/// Result type for sleuth operations.
pub type SleuthResult<T> = Result<T, SleuthError>;
