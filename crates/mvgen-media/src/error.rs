//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::composite::ReductionError;
use crate::schedule::SchedulingError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur anywhere in the montage core.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Scheduling failed: {0}")]
    Scheduling(#[from] SchedulingError),

    #[error("Reduction failed: {0}")]
    Reduction(#[from] ReductionError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the operation was stopped on request rather than failing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MediaError::Reduction(ReductionError::Cancelled))
    }
}
