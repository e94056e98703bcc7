//! Cut instructions and render plans.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clip::{ClipId, ClipSource, ClipVariant};

/// Effect tag attached to a cut. Binding it to pixels is the renderer's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CutEffect {
    #[default]
    None,
    /// Fade in from black over the first half of the cut.
    FadeIn,
    /// Fade out to black (quarter of the cut before a drop, half for the outro).
    FadeOut,
    /// Fully dimmed, a near-black hold.
    Dim,
}

impl CutEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            CutEffect::None => "none",
            CutEffect::FadeIn => "fade_in",
            CutEffect::FadeOut => "fade_out",
            CutEffect::Dim => "dim",
        }
    }
}

impl fmt::Display for CutEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One schedule entry: play `span` seconds of `clip` starting at `offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Cut {
    pub source: ClipSource,
    pub clip: ClipId,
    /// Seconds into the source clip.
    pub offset: f64,
    /// Seconds of playback.
    pub span: f64,
    /// Beats covered by this cut (0 for intro/outro padding).
    pub beats: u32,
    #[serde(default)]
    pub effect: CutEffect,
    /// Look of the source clip, assigned at preload.
    #[serde(default)]
    pub variant: ClipVariant,
}

impl Cut {
    /// End position inside the source clip.
    pub fn end(&self) -> f64 {
        self.offset + self.span
    }

    /// Whether this cut is intro/outro padding rather than a beat-synced cut.
    pub fn is_padding(&self) -> bool {
        self.source == ClipSource::Title
    }
}

/// Ordered cuts describing one take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderPlan {
    pub take_index: usize,
    /// Artifact name the renderer writes this take to.
    pub artifact: String,
    pub cuts: Vec<Cut>,
}

impl RenderPlan {
    pub fn new(take_index: usize, artifact: impl Into<String>, cuts: Vec<Cut>) -> Self {
        Self {
            take_index,
            artifact: artifact.into(),
            cuts,
        }
    }

    /// Total playback length in seconds.
    pub fn total_span(&self) -> f64 {
        self.cuts.iter().map(|c| c.span).sum()
    }

    /// Beats consumed by beat-synced cuts.
    pub fn main_loop_beats(&self) -> u32 {
        self.cuts.iter().map(|c| c.beats).sum()
    }

    /// Beat-synced cuts only, in playback order.
    pub fn main_loop_cuts(&self) -> impl Iterator<Item = &Cut> {
        self.cuts.iter().filter(|c| !c.is_padding())
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}
