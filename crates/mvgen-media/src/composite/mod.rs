//! Composite reduction of rendered takes.
//!
//! N takes are folded into one video through pairwise difference blends,
//! level by level, with every intermediate written to a deterministic name
//! so interrupted runs resume where they stopped.
//!
//! # Usage
//!
//! ```rust,ignore
//! use mvgen_media::composite::CompositeReducer;
//!
//! let reducer = CompositeReducer::new(blender).with_max_parallel(2);
//! let outcome = reducer.reduce(&takes, &names, &temp_dir).await?;
//! println!("composite at {}", outcome.final_artifact.display());
//! ```

mod graph;
mod probe;
mod reducer;

pub use graph::{CompositeGraph, CompositeNode, NodeId};
pub use probe::{ArtifactProbe, FsArtifactProbe};
pub use reducer::{BlendExecutor, CompositeReducer, ReductionOutcome};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during reduction.
#[derive(Debug, Error)]
pub enum ReductionError {
    #[error("No takes to reduce")]
    NoTakes,

    #[error("Blend into {} failed: {source}", .output.display())]
    BlendFailed {
        output: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Expected artifact is missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Reduction cancelled")]
    Cancelled,
}

impl ReductionError {
    pub fn blend_failed(output: &Path, source: impl Into<BoxError>) -> Self {
        Self::BlendFailed {
            output: output.to_path_buf(),
            source: source.into(),
        }
    }
}

/// Result type for reduction operations.
pub type ReductionResult<T> = Result<T, ReductionError>;
