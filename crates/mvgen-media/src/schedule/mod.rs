//! Beat-synchronized cut scheduling.
//!
//! Produces one [`RenderPlan`](mvgen_models::RenderPlan) per take: an
//! optional title intro, a main loop of footage cuts whose spans are whole
//! multiples of a beat, and a title outro padding the song to its end.
//!
//! Two pacing policies share the same loop:
//! - [`Pacing::Uniform`]: rates drawn from one fixed distribution, running
//!   until the last downbeat.
//! - [`Pacing::IntensityDriven`]: rates follow the section intensities,
//!   running for exactly 16 beats per analyzed section.

mod config;
mod pacing;
mod pool;
mod progress;
mod scheduler;

pub use config::SchedulerConfig;
pub use pacing::{
    BlockRate, Pacing, HIGH_RATES, LOW_RATES, MEDIUM_RATES, UNIFORM_RATES,
};
pub use pool::{frame_for_resolution, ClipPool};
pub use progress::ProgressTicker;
pub use scheduler::{BeatScheduler, SongTiming};

use thiserror::Error;

/// Errors that can occur while scheduling a take.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("Footage pool is empty")]
    EmptyClipPool,

    #[error("Title pool is empty but the take needs intro/outro padding")]
    EmptyTitlePool,

    #[error("Intensity-driven pacing needs at least one analyzed section")]
    EmptyIntensity,

    #[error("Invalid tempo: {0} BPM")]
    InvalidBpm(f64),

    #[error("No clip in the pool is long enough for a {span:.3}s cut ({attempts} draws)")]
    NoUsableClip { span: f64, attempts: u32 },

    #[error("Gave up finding a clip for a {span:.3}s cut after {attempts} draws")]
    RetryBudgetExceeded { span: f64, attempts: u32 },
}

/// Result type for scheduling operations.
pub type SchedulingResult<T> = Result<T, SchedulingError>;
