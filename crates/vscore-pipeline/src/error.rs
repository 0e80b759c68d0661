//! Pipeline error types.

use thiserror::Error;

use vscore_genai::GenAiError;
use vscore_intel::IntelError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Video intelligence error: {0}")]
    Intel(#[from] IntelError),

    #[error("Generative model error: {0}")]
    GenAi(#[from] GenAiError),

    #[error("Indexing failed: {0}")]
    IndexingFailed(String),

    #[error("Indexing did not finish after {attempts} status checks")]
    IndexingTimedOut { attempts: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stage '{stage}' timed out after {seconds}s")]
    StageTimeout { stage: &'static str, seconds: u64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run panicked: {0}")]
    Panicked(String),
}

impl PipelineError {
    pub fn indexing_failed(msg: impl Into<String>) -> Self {
        Self::IndexingFailed(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short message safe to hand to the caller.
    ///
    /// Full causes stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => format!("Invalid upload: {}", msg),
            Self::IndexingFailed(_) => "The video could not be processed".to_string(),
            Self::IndexingTimedOut { .. } => "Video processing took too long".to_string(),
            Self::StageTimeout { .. } => "Analysis took too long".to_string(),
            Self::Intel(IntelError::RateLimited(_)) | Self::GenAi(GenAiError::RateLimited(_)) => {
                "The analysis service is busy, please try again later".to_string()
            }
            Self::Intel(_) | Self::GenAi(_) => "The analysis service is unavailable".to_string(),
            Self::Config(_) | Self::Io(_) | Self::Panicked(_) => "Internal error".to_string(),
        }
    }

    /// Metric label for the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Intel(_) => "intel",
            Self::GenAi(_) => "genai",
            Self::IndexingFailed(_) => "indexing_failed",
            Self::IndexingTimedOut { .. } => "indexing_timeout",
            Self::InvalidInput(_) => "invalid_input",
            Self::StageTimeout { .. } => "stage_timeout",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Panicked(_) => "panicked",
        }
    }
}
