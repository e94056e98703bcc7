//! Song structure analysis.
//!
//! Finds where the music actually plays (the downbeat window) and how loud
//! each 16-beat section is relative to the rest of the song.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Track        │───►│ Downbeat     │───►│ Intensity    │
//! │ (mono f32)   │    │ window       │    │ per section  │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use mvgen_media::analysis::{analyze_structure, Track};
//!
//! let track = Track::from_samples("music/song.f32", samples, 44100, 128.0)?;
//! let structure = analyze_structure(&track, SchedulingMode::Smart)?;
//! println!("{} sections", structure.segments.len());
//! ```

mod downbeat;
mod intensity;
mod tempo;
mod track;

pub use downbeat::{analyze_downbeats, DownbeatWindow};
pub use intensity::{
    classify_intensity, samples_per_segment, section_timestamps, segment_length,
    BEATS_PER_SEGMENT,
};
pub use tempo::estimate_bpm;
pub use track::Track;

use mvgen_models::{IntensityLevel, IntensityReport, IntensitySegment, SchedulingMode};
use thiserror::Error;
use tracing::info;

use crate::schedule::SongTiming;

/// Errors that can occur during structure analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Waveform has no samples")]
    EmptyWaveform,

    #[error("No complete 16-beat section inside the downbeat window")]
    EmptyIntensity,

    #[error("Invalid tempo: {0} BPM")]
    InvalidBpm(f64),

    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(f64),

    #[error("Tempo undetectable ({onsets} onsets found)")]
    TempoUndetectable { onsets: usize },
}

/// Result type for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Everything the scheduler needs to know about a song.
#[derive(Debug, Clone)]
pub struct TrackStructure {
    pub duration: f64,
    pub bpm: f64,
    pub window: DownbeatWindow,
    pub segments: Vec<IntensitySegment>,
}

impl TrackStructure {
    pub fn timing(&self) -> SongTiming {
        SongTiming {
            window: self.window,
            duration: self.duration,
            bpm: self.bpm,
        }
    }

    pub fn levels(&self) -> Vec<IntensityLevel> {
        self.segments.iter().map(|s| s.level).collect()
    }

    pub fn report(&self) -> IntensityReport {
        IntensityReport::from_segments(&self.segments)
    }
}

/// Run the downbeat and intensity analysis for one track.
///
/// A track too short for a single section only fails in modes that pace by
/// intensity; otherwise the section list is left empty.
pub fn analyze_structure(track: &Track, mode: SchedulingMode) -> AnalysisResult<TrackStructure> {
    let window = analyze_downbeats(track)?;
    let segments = match classify_intensity(track, &window) {
        Ok(segments) => segments,
        Err(AnalysisError::EmptyIntensity) if !mode.needs_intensity() => Vec::new(),
        Err(e) => return Err(e),
    };

    info!(
        track = %track.path().display(),
        bpm = track.bpm(),
        duration = track.duration(),
        window_start = window.start,
        window_finish = window.finish,
        sections = segments.len(),
        "Analyzed track structure"
    );

    Ok(TrackStructure {
        duration: track.duration(),
        bpm: track.bpm(),
        window,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_structure() {
        // 10 Hz, 120 BPM: 80 samples per section; quiet pad on both ends
        let mut samples = vec![0.0f32; 10];
        samples.extend((0..160).map(|i| if i < 80 { 0.7 } else { 1.0 }));
        samples.extend(vec![0.0f32; 10]);
        let track = Track::from_samples("music/song.f32", samples, 10, 120.0).unwrap();

        let structure = analyze_structure(&track, SchedulingMode::Smart).unwrap();
        assert!((structure.window.start - 1.0).abs() < 1e-9);
        assert!((structure.window.finish - 17.0).abs() < 1e-9);
        assert_eq!(
            structure.levels(),
            vec![IntensityLevel::Medium, IntensityLevel::High]
        );

        let timing = structure.timing();
        assert_eq!(timing.window, structure.window);
        assert_eq!(structure.report().rows.len(), 2);
    }

    #[test]
    fn test_short_track_only_fails_intensity_pacing() {
        // 40 samples at 10 Hz is half a section at 120 BPM
        let track = Track::from_samples("music/jingle.f32", vec![1.0f32; 40], 10, 120.0).unwrap();

        assert!(matches!(
            analyze_structure(&track, SchedulingMode::Smart),
            Err(AnalysisError::EmptyIntensity)
        ));

        let structure = analyze_structure(&track, SchedulingMode::Simple).unwrap();
        assert!(structure.segments.is_empty());
        assert!((structure.window.finish - 4.0).abs() < 1e-9);
    }
}
