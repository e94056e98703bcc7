//! Deterministic artifact naming.
//!
//! Every intermediate of a run is addressed by a name derived from the song
//! stem and its position in the pipeline, so an interrupted run can be resumed
//! by checking which names already exist.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Marker embedded in take artifact names.
pub const TAKE_MARKER: &str = "_subVid";

/// Naming scheme for one song.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ArtifactNames {
    /// Song file name without extension.
    pub stem: String,
}

impl ArtifactNames {
    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }

    /// `{stem}_subVid{index}.mp4`
    pub fn take(&self, index: usize) -> String {
        format!("{}{}{}.mp4", self.stem, TAKE_MARKER, index)
    }

    /// Render plan sidecar for a take.
    pub fn take_plan(&self, index: usize) -> String {
        format!("{}{}{}.plan.json", self.stem, TAKE_MARKER, index)
    }

    /// Parse the take index out of a take artifact name for this song.
    ///
    /// Only canonical names match, so each index maps to exactly one file.
    pub fn parse_take_index(&self, file_name: &str) -> Option<usize> {
        let prefix = format!("{}{}", self.stem, TAKE_MARKER);
        let digits = file_name.strip_prefix(&prefix)?.strip_suffix(".mp4")?;
        let index: usize = digits.parse().ok()?;
        (index.to_string() == digits).then_some(index)
    }

    /// Intermediate blend at `level` (>= 1), position `index`.
    pub fn blend(&self, level: usize, index: usize) -> String {
        match level {
            1 => format!("{}_blended{}.mp4", self.stem, index),
            2 => format!("{}_mashed{}.mp4", self.stem, index),
            _ => format!("{}_mashed{}_{}.mp4", self.stem, level, index),
        }
    }

    /// Final composite of all takes.
    pub fn generated(&self) -> String {
        format!("{}_generated.mp4", self.stem)
    }

    /// Composite after the chroma shift pass.
    pub fn generated_final(&self) -> String {
        format!("{}_generated_final.mp4", self.stem)
    }

    /// Intermediate audio track for muxing.
    pub fn temp_audio(&self) -> String {
        format!("{}_temp.aac", self.stem)
    }

    pub fn intensities(&self) -> String {
        format!("{}_intensities.json", self.stem)
    }

    pub fn reduction_plan(&self) -> String {
        format!("{}_reduction.json", self.stem)
    }

    pub fn finishing_plan(&self) -> String {
        format!("{}_finishing.json", self.stem)
    }
}
