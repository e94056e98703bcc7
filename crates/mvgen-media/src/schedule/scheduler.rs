//! The cut loop.
//!
//! # Layout of a take
//!
//! ```text
//! 0            window.start                 window.finish    duration
//! │  title     │ footage │ footage │ ...  │ footage │  title   │
//! │ Dim/FadeIn │  rate·beat spans, 16-beat blocks   │ FadeOut  │
//! ```

use std::sync::Arc;

use mvgen_models::{ClipHandle, ClipSource, Cut, CutEffect, RenderPlan};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::SchedulerConfig;
use super::pacing::Pacing;
use super::pool::ClipPool;
use super::progress::ProgressTicker;
use super::{SchedulingError, SchedulingResult};
use crate::analysis::{DownbeatWindow, BEATS_PER_SEGMENT};
use crate::metrics;

/// Song facts the scheduler works from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SongTiming {
    pub window: DownbeatWindow,
    pub duration: f64,
    pub bpm: f64,
}

impl SongTiming {
    /// Seconds per beat.
    pub fn beat_length(&self) -> f64 {
        60.0 / self.bpm
    }
}

/// Builds render plans from clip pools and a pacing policy.
///
/// Holds only shared, read-only state so one scheduler can serve many takes
/// in parallel.
#[derive(Debug, Clone)]
pub struct BeatScheduler {
    footage: Arc<ClipPool>,
    titles: Arc<ClipPool>,
    pacing: Pacing,
    config: SchedulerConfig,
}

impl BeatScheduler {
    pub fn new(
        footage: Arc<ClipPool>,
        titles: Arc<ClipPool>,
        pacing: Pacing,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            footage,
            titles,
            pacing,
            config,
        }
    }

    pub fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Schedule one take.
    pub fn schedule<R: Rng + ?Sized>(
        &self,
        timing: &SongTiming,
        take_index: usize,
        artifact: impl Into<String>,
        rng: &mut R,
    ) -> SchedulingResult<RenderPlan> {
        if !timing.bpm.is_finite() || timing.bpm <= 0.0 {
            return Err(SchedulingError::InvalidBpm(timing.bpm));
        }
        if self.footage.is_empty() {
            return Err(SchedulingError::EmptyClipPool);
        }
        if let Pacing::IntensityDriven(levels) = &self.pacing {
            if levels.is_empty() {
                return Err(SchedulingError::EmptyIntensity);
            }
        }

        let beat = timing.beat_length();
        let window = &timing.window;
        let mut cuts = Vec::new();

        if window.start > 0.0 {
            let effect = if window.start < self.config.intro_dim_threshold_secs {
                CutEffect::Dim
            } else {
                CutEffect::FadeIn
            };
            cuts.push(self.title_cut(window.start, effect, rng)?);
        }

        let mut position = window.start;
        let mut beats_elapsed: u32 = 0;
        let mut cursor: usize = 0;
        let mut rate: u32 = 0;
        let mut fade_out = false;
        let mut retries: u64 = 0;
        let mut ticker = ProgressTicker::new();

        while self.pacing.should_continue(position, beats_elapsed, window) {
            if beats_elapsed % BEATS_PER_SEGMENT == 0 {
                let block = self.pacing.block_rate(cursor, rng);
                rate = block.rate;
                fade_out = block.fade_out;
                cursor += 1;
            }

            let span = rate as f64 * beat;
            let (clip, attempts) = self.draw(&self.footage, span, rng)?;
            retries += u64::from(attempts - 1);

            let effect = if std::mem::take(&mut fade_out) {
                CutEffect::FadeOut
            } else {
                CutEffect::None
            };
            cuts.push(Cut {
                source: ClipSource::Footage,
                clip: clip.id.clone(),
                offset: random_offset(clip, span, rng),
                span,
                beats: rate,
                effect,
                variant: clip.variant,
            });

            position += span;
            beats_elapsed += rate;

            if let Some(percent) = ticker.update(self.pacing.progress(position, beats_elapsed, window)) {
                debug!(take = take_index, percent = percent, "Scheduling progress");
            }
        }

        if position < timing.duration {
            cuts.push(self.title_cut(timing.duration - position, CutEffect::FadeOut, rng)?);
        }

        metrics::record_take_scheduled(self.pacing.as_str(), cuts.len());
        metrics::record_clip_retries(retries);

        debug!(
            take = take_index,
            mode = self.pacing.as_str(),
            cuts = cuts.len(),
            beats = beats_elapsed,
            blocks = cursor,
            retries = retries,
            "Scheduled take"
        );

        Ok(RenderPlan::new(take_index, artifact, cuts))
    }

    /// Draw from `pool` until a clip fits `span`, returning it with the draw count.
    fn draw<'a, R: Rng + ?Sized>(
        &self,
        pool: &'a ClipPool,
        span: f64,
        rng: &mut R,
    ) -> SchedulingResult<(&'a ClipHandle, u32)> {
        let budget = self.config.max_clip_attempts.max(1);

        for attempt in 1..=budget {
            let clip = pool.choose(rng).ok_or(SchedulingError::EmptyClipPool)?;
            if clip.fits(span) {
                return Ok((clip, attempt));
            }
        }

        if pool.any_fits(span) {
            Err(SchedulingError::RetryBudgetExceeded {
                span,
                attempts: budget,
            })
        } else {
            Err(SchedulingError::NoUsableClip {
                span,
                attempts: budget,
            })
        }
    }

    fn title_cut<R: Rng + ?Sized>(
        &self,
        span: f64,
        effect: CutEffect,
        rng: &mut R,
    ) -> SchedulingResult<Cut> {
        if self.titles.is_empty() {
            return Err(SchedulingError::EmptyTitlePool);
        }
        let (title, _) = self.draw(&self.titles, span, rng)?;

        Ok(Cut {
            source: ClipSource::Title,
            clip: title.id.clone(),
            offset: 0.0,
            span,
            beats: 0,
            effect,
            variant: title.variant,
        })
    }
}

/// Uniform start offset in `[0, duration - span)`, 0 on an exact fit.
fn random_offset<R: Rng + ?Sized>(clip: &ClipHandle, span: f64, rng: &mut R) -> f64 {
    let slack = clip.duration - span;
    if slack > 0.0 {
        rng.random_range(0.0..slack)
    } else {
        0.0
    }
}
