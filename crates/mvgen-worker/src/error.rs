//! Worker error types.

use thiserror::Error;

use mvgen_media::{AnalysisError, MediaError, ReductionError, SchedulingError};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Found takes {found:?} outside the configured range 0..{configured}")]
    UnexpectedTakes { configured: usize, found: Vec<usize> },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn render_failed(msg: impl Into<String>) -> Self {
        Self::RenderFailed(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if error is retryable.
    ///
    /// Encoder failures and I/O hiccups may succeed on a rerun; artifacts
    /// already produced are reused.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkerError::RenderFailed(_)
                | WorkerError::Io(_)
                | WorkerError::Media(MediaError::Io(_))
                | WorkerError::Media(MediaError::Reduction(ReductionError::BlendFailed { .. }))
                | WorkerError::Media(MediaError::Reduction(ReductionError::MissingArtifact(_)))
                | WorkerError::Media(MediaError::Scheduling(
                    SchedulingError::RetryBudgetExceeded { .. }
                ))
        )
    }

    /// Check if the run was stopped on request.
    pub fn is_cancelled(&self) -> bool {
        match self {
            WorkerError::Cancelled => true,
            WorkerError::Media(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

impl From<AnalysisError> for WorkerError {
    fn from(e: AnalysisError) -> Self {
        Self::Media(e.into())
    }
}

impl From<SchedulingError> for WorkerError {
    fn from(e: SchedulingError) -> Self {
        Self::Media(e.into())
    }
}

impl From<ReductionError> for WorkerError {
    fn from(e: ReductionError) -> Self {
        Self::Media(e.into())
    }
}
