//! Post-reduction steps: chroma shift, then the song muxed back in.

use std::path::{Path, PathBuf};

use mvgen_models::{ArtifactNames, FinishStep, FinishingPlan};
use tracing::debug;

use crate::composite::ArtifactProbe;

/// Where each finishing artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishingPaths {
    /// Output of the reduction.
    pub composite: PathBuf,
    /// Chroma-shifted composite, still without audio.
    pub shifted: PathBuf,
    pub audio_source: PathBuf,
    pub audio_intermediate: PathBuf,
    /// Deliverable.
    pub output: PathBuf,
}

impl FinishingPaths {
    pub fn new(
        composite: impl Into<PathBuf>,
        names: &ArtifactNames,
        temp_dir: &Path,
        out_dir: &Path,
        audio_source: impl Into<PathBuf>,
    ) -> Self {
        Self {
            composite: composite.into(),
            shifted: temp_dir.join(names.generated_final()),
            audio_source: audio_source.into(),
            audio_intermediate: temp_dir.join(names.temp_audio()),
            output: out_dir.join(names.generated_final()),
        }
    }
}

/// List the finishing steps whose outputs do not exist yet.
pub async fn plan_finishing<P: ArtifactProbe + ?Sized>(
    paths: &FinishingPaths,
    probe: &P,
) -> FinishingPlan {
    let mut steps = Vec::new();

    if !probe.exists(&paths.shifted).await {
        steps.push(FinishStep::ChromaShift {
            input: paths.composite.clone(),
            output: paths.shifted.clone(),
        });
    }

    if !probe.exists(&paths.output).await {
        steps.push(FinishStep::MuxAudio {
            video: paths.shifted.clone(),
            audio_source: paths.audio_source.clone(),
            audio_intermediate: paths.audio_intermediate.clone(),
            output: paths.output.clone(),
        });
    }

    debug!(
        steps = steps.len(),
        output = %paths.output.display(),
        "Planned finishing"
    );

    FinishingPlan {
        steps,
        output: paths.output.clone(),
    }
}
