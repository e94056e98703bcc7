//! Decoded input song.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{AnalysisError, AnalysisResult};

/// One input song with its decoded mono samples.
///
/// Samples are shared so the same track can be analyzed from several tasks
/// without copying.
#[derive(Debug, Clone)]
pub struct Track {
    path: PathBuf,
    samples: Arc<[f32]>,
    sample_rate: u32,
    duration: f64,
    bpm: f64,
}

impl Track {
    /// Create a track with an explicit duration (e.g. from container metadata).
    pub fn new(
        path: impl AsRef<Path>,
        samples: impl Into<Arc<[f32]>>,
        sample_rate: u32,
        duration: f64,
        bpm: f64,
    ) -> AnalysisResult<Self> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(AnalysisError::InvalidDuration(duration));
        }
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(AnalysisError::InvalidBpm(bpm));
        }

        Ok(Self {
            path: path.as_ref().to_path_buf(),
            samples: samples.into(),
            sample_rate,
            duration,
            bpm,
        })
    }

    /// Create a track whose duration is derived from the sample count.
    pub fn from_samples(
        path: impl AsRef<Path>,
        samples: impl Into<Arc<[f32]>>,
        sample_rate: u32,
        bpm: f64,
    ) -> AnalysisResult<Self> {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(AnalysisError::EmptyWaveform);
        }
        let duration = samples.len() as f64 / sample_rate.max(1) as f64;
        Self::new(path, samples, sample_rate, duration, bpm)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Seconds between two beats.
    pub fn beat_length(&self) -> f64 {
        60.0 / self.bpm
    }

    /// Song name without directory or extension.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "track".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_samples_derives_duration() {
        let track = Track::from_samples("music/song.f32", vec![0.0f32; 22050], 44100, 120.0).unwrap();
        assert!((track.duration() - 0.5).abs() < 1e-9);
        assert!((track.beat_length() - 0.5).abs() < 1e-9);
        assert_eq!(track.stem(), "song");
    }

    #[test]
    fn test_rejects_invalid_tempo_and_duration() {
        assert!(matches!(
            Track::new("a", vec![0.0f32; 4], 4, 1.0, 0.0),
            Err(AnalysisError::InvalidBpm(_))
        ));
        assert!(matches!(
            Track::new("a", vec![0.0f32; 4], 4, -1.0, 120.0),
            Err(AnalysisError::InvalidDuration(_))
        ));
        assert!(matches!(
            Track::from_samples("a", Vec::<f32>::new(), 44100, 120.0),
            Err(AnalysisError::EmptyWaveform)
        ));
    }
}
