//! First/last downbeat estimation.
//!
//! A rough loudness heuristic rather than an onset detector: the window opens
//! at the first sample reaching two thirds of the track's peak and closes
//! after the last one.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::track::Track;
use super::{AnalysisError, AnalysisResult};

/// Peak is divided by this to get the loudness threshold.
const PEAK_DIVISOR: f32 = 1.5;

/// Span between the first and last loud moment of a track, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DownbeatWindow {
    pub start: f64,
    pub finish: f64,
}

impl DownbeatWindow {
    pub fn new(start: f64, finish: f64) -> Self {
        Self { start, finish }
    }

    /// Length of the window in seconds.
    pub fn span(&self) -> f64 {
        (self.finish - self.start).max(0.0)
    }

    /// Whether `0 <= start <= finish <= duration` holds.
    pub fn is_valid_for(&self, duration: f64) -> bool {
        0.0 <= self.start && self.start <= self.finish && self.finish <= duration
    }
}

/// Estimate the first and last downbeat of a track.
pub fn analyze_downbeats(track: &Track) -> AnalysisResult<DownbeatWindow> {
    let samples = track.samples();
    if samples.is_empty() {
        return Err(AnalysisError::EmptyWaveform);
    }

    let peak = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let threshold = peak / PEAK_DIVISOR;
    let len = samples.len() as f64;
    let duration = track.duration();

    let first = samples.iter().position(|&x| x >= threshold);
    let from_end = samples.iter().rev().position(|&x| x >= threshold);

    let window = match (first, from_end) {
        (Some(first), Some(from_end)) => DownbeatWindow {
            start: first as f64 / len * duration,
            finish: (len - from_end as f64) / len * duration,
        },
        // Only an all-negative waveform has no sample above its own peak / 1.5.
        _ => DownbeatWindow {
            start: 0.0,
            finish: duration,
        },
    };

    debug!(
        peak = peak,
        start = window.start,
        finish = window.finish,
        "Estimated downbeat window"
    );

    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(samples: Vec<f32>, duration: f64) -> Track {
        Track::new("song.f32", samples, 10, duration, 120.0).unwrap()
    }

    #[test]
    fn test_window_brackets_loud_region() {
        // 10 samples over 1 second; loud samples at indices 2..=6
        let samples = vec![0.0, 0.1, 0.9, 0.5, 1.0, 0.2, 0.8, 0.1, 0.0, 0.0];
        let window = analyze_downbeats(&track(samples, 1.0)).unwrap();

        assert!((window.start - 0.2).abs() < 1e-9);
        assert!((window.finish - 0.7).abs() < 1e-9);
        assert!(window.is_valid_for(1.0));
    }

    #[test]
    fn test_loud_from_first_sample() {
        let samples = vec![1.0, 0.0, 0.0, 1.0];
        let window = analyze_downbeats(&track(samples, 2.0)).unwrap();
        assert_eq!(window.start, 0.0);
        assert!((window.finish - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_invariant_on_noisy_waveform() {
        let samples: Vec<f32> = (0..1000)
            .map(|i| ((i * 7919) % 1000) as f32 / 1000.0 - 0.5)
            .collect();
        let window = analyze_downbeats(&track(samples, 100.0)).unwrap();
        assert!(window.is_valid_for(100.0));
    }

    #[test]
    fn test_all_negative_waveform_uses_full_track() {
        let samples = vec![-1.0, -0.5, -0.9];
        let window = analyze_downbeats(&track(samples, 3.0)).unwrap();
        assert_eq!(window, DownbeatWindow::new(0.0, 3.0));
    }

    #[test]
    fn test_empty_waveform_fails() {
        let empty = Track::new("song.f32", Vec::<f32>::new(), 10, 1.0, 120.0).unwrap();
        assert!(matches!(
            analyze_downbeats(&empty),
            Err(AnalysisError::EmptyWaveform)
        ));
    }
}
