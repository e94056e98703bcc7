//! Reduction and finishing instructions for the external encoder.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Pairwise compositing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Difference,
}

/// One pairwise blend: `top` composited over `bottom` into `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BlendStep {
    /// Tree level, 1 for blends of raw takes.
    pub level: usize,
    /// Position within the level.
    pub index: usize,
    pub top: PathBuf,
    pub bottom: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub mode: BlendMode,
}

/// Blends still required to produce the composite, grouped by level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ReductionPlan {
    /// Levels in execution order; steps within a level are independent.
    pub levels: Vec<Vec<BlendStep>>,
    /// Artifacts already present that were not scheduled.
    pub skipped: Vec<PathBuf>,
    pub final_artifact: PathBuf,
}

impl ReductionPlan {
    /// Total number of blends to run.
    pub fn step_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    /// Whether the composite already exists or needs no blending.
    pub fn is_complete(&self) -> bool {
        self.step_count() == 0
    }

    /// All steps in a valid execution order.
    pub fn steps(&self) -> impl Iterator<Item = &BlendStep> {
        self.levels.iter().flatten()
    }
}

/// Post-reduction step for the external encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum FinishStep {
    /// Chroma shift glitch over the whole composite.
    ChromaShift { input: PathBuf, output: PathBuf },
    /// Replace the video's audio with the song.
    MuxAudio {
        video: PathBuf,
        audio_source: PathBuf,
        audio_intermediate: PathBuf,
        output: PathBuf,
    },
}

impl FinishStep {
    pub fn output(&self) -> &PathBuf {
        match self {
            FinishStep::ChromaShift { output, .. } => output,
            FinishStep::MuxAudio { output, .. } => output,
        }
    }
}

/// Ordered finishing steps that still need to run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct FinishingPlan {
    pub steps: Vec<FinishStep>,
    pub output: PathBuf,
}
