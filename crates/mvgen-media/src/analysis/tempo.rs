//! Tempo estimation for tracks without a known BPM.
//!
//! Energy-flux onset detection on 10 ms blocks, followed by the median
//! inter-onset interval. Good enough for steady 4/4 material; a known BPM
//! should always be preferred.

use tracing::debug;

use super::{AnalysisError, AnalysisResult};

/// Analysis blocks per second.
const BLOCKS_PER_SECOND: u32 = 100;
/// Onsets closer than this are merged (caps detection at 300 BPM).
const MIN_ONSET_GAP_SECS: f64 = 0.2;
/// Estimates are folded into `[MIN_BPM, MAX_BPM)`.
const MIN_BPM: f64 = 90.0;
const MAX_BPM: f64 = 180.0;

/// Estimate the tempo of a mono signal, rounded to 0.1 BPM.
pub fn estimate_bpm(samples: &[f32], sample_rate: u32) -> AnalysisResult<f64> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyWaveform);
    }

    let block = (sample_rate / BLOCKS_PER_SECOND).max(1) as usize;
    let energies: Vec<f64> = samples
        .chunks_exact(block)
        .map(|chunk| chunk.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>() / block as f64)
        .collect();

    let onsets = detect_onsets(&energies, MIN_ONSET_GAP_SECS * BLOCKS_PER_SECOND as f64);
    if onsets.len() < 2 {
        return Err(AnalysisError::TempoUndetectable {
            onsets: onsets.len(),
        });
    }

    let mut intervals: Vec<usize> = onsets.windows(2).map(|w| w[1] - w[0]).collect();
    intervals.sort_unstable();
    let median_blocks = intervals[intervals.len() / 2];
    let seconds_per_beat = (median_blocks * block) as f64 / sample_rate as f64;

    let raw_bpm = 60.0 / seconds_per_beat;
    let bpm = (fold_into_range(raw_bpm) * 10.0).round() / 10.0;

    debug!(
        onsets = onsets.len(),
        raw_bpm = raw_bpm,
        bpm = bpm,
        "Estimated tempo"
    );

    Ok(bpm)
}

/// Block indices where energy rises sharply.
fn detect_onsets(energies: &[f64], min_gap_blocks: f64) -> Vec<usize> {
    if energies.len() < 3 {
        return Vec::new();
    }

    let flux: Vec<f64> = std::iter::once(0.0)
        .chain(energies.windows(2).map(|w| (w[1] - w[0]).max(0.0)))
        .collect();

    let mean = flux.iter().sum::<f64>() / flux.len() as f64;
    let variance = flux.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / flux.len() as f64;
    let threshold = mean + variance.sqrt();

    let min_gap = min_gap_blocks.ceil() as usize;
    let mut onsets: Vec<usize> = Vec::new();

    for i in 1..flux.len() - 1 {
        let is_peak = flux[i] > threshold && flux[i] >= flux[i - 1] && flux[i] > flux[i + 1];
        if !is_peak || flux[i] <= 0.0 {
            continue;
        }
        match onsets.last() {
            Some(&last) if i - last < min_gap => {}
            _ => onsets.push(i),
        }
    }

    onsets
}

fn fold_into_range(mut bpm: f64) -> f64 {
    if !bpm.is_finite() || bpm <= 0.0 {
        return bpm;
    }
    while bpm >= MAX_BPM {
        bpm /= 2.0;
    }
    while bpm < MIN_BPM {
        bpm *= 2.0;
    }
    bpm
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Short 1 kHz bursts on every beat, silence in between.
    fn click_track(bpm: f64, sample_rate: u32, seconds: f64) -> Vec<f32> {
        let total = (seconds * sample_rate as f64) as usize;
        let beat = (60.0 / bpm * sample_rate as f64).round() as usize;
        let burst = sample_rate as usize / 20;
        (0..total)
            .map(|i| {
                let phase = i % beat;
                if phase < burst {
                    let t = i as f32 / sample_rate as f32;
                    0.8 * (2.0 * std::f32::consts::PI * 1000.0 * t).sin()
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn test_detects_120_bpm() {
        let samples = click_track(120.0, 8000, 12.0);
        let bpm = estimate_bpm(&samples, 8000).unwrap();
        assert!((bpm - 120.0).abs() < 1.0, "Expected ~120 BPM, got {}", bpm);
    }

    #[test]
    fn test_slow_clicks_fold_into_range() {
        // 60 BPM clicks fold up an octave
        let samples = click_track(60.0, 8000, 16.0);
        let bpm = estimate_bpm(&samples, 8000).unwrap();
        assert!((bpm - 120.0).abs() < 1.0, "Expected ~120 BPM, got {}", bpm);
    }

    #[test]
    fn test_silence_is_undetectable() {
        let samples = vec![0.0f32; 8000 * 4];
        assert!(matches!(
            estimate_bpm(&samples, 8000),
            Err(AnalysisError::TempoUndetectable { onsets: 0 })
        ));
    }

    #[test]
    fn test_fold_into_range() {
        assert!((fold_into_range(240.0) - 120.0).abs() < 1e-9);
        assert!((fold_into_range(45.0) - 90.0).abs() < 1e-9);
        assert!((fold_into_range(128.0) - 128.0).abs() < 1e-9);
    }
}
