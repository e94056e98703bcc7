//! Cut-rate policies.
//!
//! A rate is the number of beats one cut lasts. It is chosen at every
//! 16-beat boundary and held for the whole block; every rate divides 16 so
//! blocks never straddle a boundary.

use std::sync::Arc;

use mvgen_models::{IntensityLevel, SchedulingMode};
use rand::Rng;

use crate::analysis::{DownbeatWindow, BEATS_PER_SEGMENT};

/// Rates for uniform pacing.
pub const UNIFORM_RATES: [u32; 9] = [1, 4, 4, 4, 8, 8, 16, 16, 16];
/// Rates for a High section.
pub const HIGH_RATES: [u32; 6] = [1, 1, 1, 4, 4, 4];
/// Rates for a Medium section.
pub const MEDIUM_RATES: [u32; 8] = [4, 4, 4, 4, 8, 8, 8, 16];
/// Rates for a Low section.
pub const LOW_RATES: [u32; 7] = [8, 8, 8, 16, 16, 16, 16];

/// Rate for the next 16-beat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRate {
    pub rate: u32,
    /// The first cut of the block fades out ahead of a drop.
    pub fade_out: bool,
}

impl BlockRate {
    fn plain(rate: u32) -> Self {
        Self {
            rate,
            fade_out: false,
        }
    }
}

/// How cut rates are chosen.
#[derive(Debug, Clone)]
pub enum Pacing {
    /// Same distribution everywhere; runs until the last downbeat.
    Uniform,
    /// Rates follow section intensities; runs 16 beats per section.
    IntensityDriven(Arc<[IntensityLevel]>),
}

impl Pacing {
    pub fn from_mode(mode: SchedulingMode, levels: &[IntensityLevel]) -> Self {
        match mode {
            SchedulingMode::Simple => Pacing::Uniform,
            SchedulingMode::Smart => Pacing::IntensityDriven(levels.into()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Pacing::Uniform => SchedulingMode::Simple.as_str(),
            Pacing::IntensityDriven(_) => SchedulingMode::Smart.as_str(),
        }
    }

    /// Choose the rate for block `cursor`.
    pub fn block_rate<R: Rng + ?Sized>(&self, cursor: usize, rng: &mut R) -> BlockRate {
        match self {
            Pacing::Uniform => BlockRate::plain(draw(&UNIFORM_RATES, rng)),
            Pacing::IntensityDriven(levels) => intensity_rate(levels, cursor, rng),
        }
    }

    /// Whether the main loop schedules another cut.
    pub fn should_continue(&self, position: f64, beats_elapsed: u32, window: &DownbeatWindow) -> bool {
        match self {
            Pacing::Uniform => position < window.finish,
            Pacing::IntensityDriven(levels) => (beats_elapsed as usize) < total_beats(levels),
        }
    }

    /// Fraction of the main loop done, in `[0, 1]`.
    pub fn progress(&self, position: f64, beats_elapsed: u32, window: &DownbeatWindow) -> f64 {
        let fraction = match self {
            Pacing::Uniform => {
                if window.finish <= 0.0 {
                    1.0
                } else {
                    position / window.finish
                }
            }
            Pacing::IntensityDriven(levels) => {
                let total = total_beats(levels);
                if total == 0 {
                    1.0
                } else {
                    beats_elapsed as f64 / total as f64
                }
            }
        };
        fraction.clamp(0.0, 1.0)
    }
}

fn total_beats(levels: &[IntensityLevel]) -> usize {
    BEATS_PER_SEGMENT as usize * levels.len()
}

fn draw<R: Rng + ?Sized>(rates: &[u32], rng: &mut R) -> u32 {
    rates[rng.random_range(0..rates.len())]
}

fn intensity_rate<R: Rng + ?Sized>(levels: &[IntensityLevel], cursor: usize, rng: &mut R) -> BlockRate {
    let previous = cursor.checked_sub(1).and_then(|i| levels.get(i)).copied();
    let next = levels.get(cursor + 1).copied();

    match levels.get(cursor).copied().unwrap_or(IntensityLevel::Low) {
        IntensityLevel::High if previous == Some(IntensityLevel::Low) => BlockRate::plain(1),
        IntensityLevel::High => BlockRate::plain(draw(&HIGH_RATES, rng)),
        IntensityLevel::Medium => BlockRate::plain(draw(&MEDIUM_RATES, rng)),
        // Hold the calm section and fade into the drop
        IntensityLevel::Low if next == Some(IntensityLevel::High) => BlockRate {
            rate: 16,
            fade_out: true,
        },
        IntensityLevel::Low => BlockRate::plain(draw(&LOW_RATES, rng)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use mvgen_models::IntensityLevel::{High, Low, Medium};

    fn smart(levels: &[IntensityLevel]) -> Pacing {
        Pacing::from_mode(SchedulingMode::Smart, levels)
    }

    #[test]
    fn test_every_rate_divides_a_block() {
        for rate in UNIFORM_RATES
            .iter()
            .chain(&HIGH_RATES)
            .chain(&MEDIUM_RATES)
            .chain(&LOW_RATES)
        {
            assert_eq!(BEATS_PER_SEGMENT % rate, 0);
        }
    }

    #[test]
    fn test_low_before_high_holds_and_fades() {
        let mut rng = StdRng::seed_from_u64(0);
        let pacing = smart(&[Low, High]);
        assert_eq!(
            pacing.block_rate(0, &mut rng),
            BlockRate {
                rate: 16,
                fade_out: true
            }
        );
    }

    #[test]
    fn test_high_after_low_cuts_every_beat() {
        let mut rng = StdRng::seed_from_u64(0);
        let pacing = smart(&[Low, High, High]);
        for _ in 0..20 {
            assert_eq!(pacing.block_rate(1, &mut rng), BlockRate::plain(1));
        }
    }

    #[test]
    fn test_draws_stay_in_level_distribution() {
        let mut rng = StdRng::seed_from_u64(9);
        let pacing = smart(&[Medium, Medium, High, High, Low, Low]);
        for _ in 0..50 {
            assert!(MEDIUM_RATES.contains(&pacing.block_rate(0, &mut rng).rate));
            assert!(HIGH_RATES.contains(&pacing.block_rate(3, &mut rng).rate));
            let low = pacing.block_rate(5, &mut rng);
            assert!(LOW_RATES.contains(&low.rate));
            assert!(!low.fade_out);
        }
    }

    #[test]
    fn test_should_continue() {
        let window = DownbeatWindow::new(1.0, 10.0);

        assert!(Pacing::Uniform.should_continue(9.9, 0, &window));
        assert!(!Pacing::Uniform.should_continue(10.0, 0, &window));

        let pacing = smart(&[Low, High]);
        assert!(pacing.should_continue(100.0, 31, &window));
        assert!(!pacing.should_continue(0.0, 32, &window));
    }

    #[test]
    fn test_progress() {
        let window = DownbeatWindow::new(0.0, 10.0);
        assert!((Pacing::Uniform.progress(5.0, 0, &window) - 0.5).abs() < 1e-9);
        assert!((Pacing::Uniform.progress(12.0, 0, &window) - 1.0).abs() < 1e-9);

        let pacing = smart(&[Low, Low, Low, Low]);
        assert!((pacing.progress(0.0, 16, &window) - 0.25).abs() < 1e-9);
    }
}
