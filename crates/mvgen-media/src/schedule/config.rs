//! Configuration for the beat scheduler.

use serde::{Deserialize, Serialize};

/// Tunables for [`BeatScheduler`](super::BeatScheduler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum random draws when looking for a clip long enough for a cut.
    ///
    /// Clips shorter than the cut are redrawn. Once the budget is spent the
    /// take fails instead of looping forever.
    /// - Default: 64
    pub max_clip_attempts: u32,

    /// Intros shorter than this (seconds) are fully dimmed instead of faded in.
    ///
    /// - Default: 4.0
    pub intro_dim_threshold_secs: f64,

    /// Base seed for reproducible runs. Take `i` is seeded with `seed + i`.
    ///
    /// `None` seeds every take from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_clip_attempts: 64,
            intro_dim_threshold_secs: 4.0,
            seed: None,
        }
    }
}

impl SchedulerConfig {
    /// Builder: set the clip draw budget (at least 1).
    pub fn with_max_clip_attempts(mut self, attempts: u32) -> Self {
        self.max_clip_attempts = attempts.max(1);
        self
    }

    /// Builder: set the dim/fade-in threshold for intros.
    pub fn with_intro_dim_threshold(mut self, secs: f64) -> Self {
        self.intro_dim_threshold_secs = secs;
        self
    }

    /// Builder: set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
