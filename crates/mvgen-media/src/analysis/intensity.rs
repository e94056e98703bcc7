//! Per-section intensity classification.
//!
//! The analyzed window is split into consecutive 16-beat blocks. Each block's
//! mean absolute amplitude is compared with the loudest block of the same
//! track, so levels are relative rather than absolute.

use mvgen_models::{IntensityLevel, IntensitySegment};
use tracing::debug;

use super::downbeat::DownbeatWindow;
use super::track::Track;
use super::{AnalysisError, AnalysisResult};

/// Beats per analyzed section (4 bars of 4/4).
pub const BEATS_PER_SEGMENT: u32 = 16;

/// Seconds covered by one 16-beat section.
pub fn segment_length(bpm: f64) -> f64 {
    BEATS_PER_SEGMENT as f64 * 60.0 / bpm
}

/// Number of samples in one section of `track`.
///
/// Derived from the duration rather than the sample rate so it agrees with
/// the window timestamps when container metadata and sample count disagree.
pub fn samples_per_segment(track: &Track) -> usize {
    let fraction = segment_length(track.bpm()) / track.duration();
    let count = (fraction * track.samples().len() as f64 - 1e-9).ceil();
    (count as usize).max(1)
}

/// Section start timestamps from the window start until the window finish.
///
/// The last timestamp is the first one at or past `finish`.
pub fn section_timestamps(window: &DownbeatWindow, bpm: f64) -> Vec<f64> {
    let step = segment_length(bpm);
    let mut timestamps = vec![window.start];
    if !step.is_finite() || step <= 0.0 {
        return timestamps;
    }

    let mut current = window.start;
    while current < window.finish {
        current += step;
        timestamps.push(current);
    }
    timestamps
}

/// Classify every complete 16-beat block inside `window`.
pub fn classify_intensity(
    track: &Track,
    window: &DownbeatWindow,
) -> AnalysisResult<Vec<IntensitySegment>> {
    let samples = track.samples();
    if samples.is_empty() {
        return Err(AnalysisError::EmptyWaveform);
    }

    let (first, last) = window_indices(samples.len(), track.duration(), window);
    let per_segment = samples_per_segment(track);

    let means: Vec<f64> = if first <= last {
        samples[first..=last]
            .chunks_exact(per_segment)
            .map(|block| {
                let sum: f64 = block.iter().map(|&x| (x as f64).abs()).sum();
                sum / block.len() as f64
            })
            .collect()
    } else {
        Vec::new()
    };

    if means.is_empty() {
        debug!(
            per_segment = per_segment,
            window_samples = last.saturating_sub(first) + 1,
            "Window shorter than one section"
        );
        return Err(AnalysisError::EmptyIntensity);
    }

    let max_mean = means.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let segments: Vec<IntensitySegment> = means
        .iter()
        .enumerate()
        .map(|(index, &mean)| IntensitySegment {
            index,
            mean_amplitude: mean,
            level: IntensityLevel::classify(mean, max_mean),
        })
        .collect();

    debug!(
        segments = segments.len(),
        high = count_level(&segments, IntensityLevel::High),
        medium = count_level(&segments, IntensityLevel::Medium),
        low = count_level(&segments, IntensityLevel::Low),
        "Classified section intensities"
    );

    Ok(segments)
}

fn count_level(segments: &[IntensitySegment], level: IntensityLevel) -> usize {
    segments.iter().filter(|s| s.level == level).count()
}

/// Inclusive sample index range whose relative position lies in the window.
fn window_indices(len: usize, duration: f64, window: &DownbeatWindow) -> (usize, usize) {
    const EPS: f64 = 1e-9;
    let n = len as f64;
    let lo = (window.start / duration * n - EPS).ceil().max(0.0) as usize;
    let hi = (window.finish / duration * n + EPS).floor().max(0.0) as usize;
    (lo, hi.min(len - 1))
}
