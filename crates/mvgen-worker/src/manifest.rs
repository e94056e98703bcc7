//! Clip manifest (`clips.json`).
//!
//! ```json
//! {
//!   "footage": [{ "id": "city", "path": "clips/city.mp4", "duration": 42.5, "width": 1920, "height": 1080 }],
//!   "titles":  [{ "id": "logo", "path": "titles/logo.mp4", "duration": 12.0 }]
//! }
//! ```

use std::path::Path;

use mvgen_models::ClipHandle;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WorkerError, WorkerResult};

/// Footage and title clips available to a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipManifest {
    #[serde(default)]
    pub footage: Vec<ClipHandle>,
    #[serde(default)]
    pub titles: Vec<ClipHandle>,
}

impl ClipManifest {
    pub fn from_json(json: &str) -> WorkerResult<Self> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Read a manifest, resolving relative clip paths against its directory.
    pub async fn load(path: &Path) -> WorkerResult<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        let mut manifest = Self::from_json(&json)?;

        if let Some(base) = path.parent() {
            for clip in manifest.footage.iter_mut().chain(manifest.titles.iter_mut()) {
                if clip.path.is_relative() {
                    clip.path = base.join(&clip.path);
                }
            }
        }

        debug!(
            manifest = %path.display(),
            footage = manifest.footage.len(),
            titles = manifest.titles.len(),
            "Loaded clip manifest"
        );

        Ok(manifest)
    }

    fn validate(&self) -> WorkerResult<()> {
        for clip in self.footage.iter().chain(&self.titles) {
            if !clip.duration.is_finite() || clip.duration < 0.0 {
                return Err(WorkerError::invalid_input(format!(
                    "clip {} has invalid duration {}",
                    clip.id, clip.duration
                )));
            }
        }
        Ok(())
    }
}
