//! Clip pools.

use mvgen_models::{ClipHandle, ClipVariant};
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::debug;

/// Target frame size for a vertical resolution at 16:9.
pub fn frame_for_resolution(resolution: u32) -> (u32, u32) {
    let width = (resolution as u64 * 16 / 9) as u32;
    (width, resolution)
}

/// Ordered collection of clips the scheduler draws from.
#[derive(Debug, Clone, Default)]
pub struct ClipPool {
    clips: Vec<ClipHandle>,
}

impl ClipPool {
    pub fn new(clips: Vec<ClipHandle>) -> Self {
        Self { clips }
    }

    /// Build a footage pool for rendering at `resolution`.
    ///
    /// Clips whose known frame is larger than the target are dropped; every
    /// remaining clip gets a random look.
    pub fn preload<R: Rng + ?Sized>(
        clips: impl IntoIterator<Item = ClipHandle>,
        resolution: u32,
        rng: &mut R,
    ) -> Self {
        let (width, height) = frame_for_resolution(resolution);
        let mut dropped = 0usize;

        let clips: Vec<ClipHandle> = clips
            .into_iter()
            .filter(|clip| {
                let keep = !clip.exceeds_frame(width, height);
                if !keep {
                    dropped += 1;
                }
                keep
            })
            .map(|clip| {
                let variant = ClipVariant::from_unit(rng.random::<f64>());
                clip.with_variant(variant)
            })
            .collect();

        debug!(
            kept = clips.len(),
            dropped = dropped,
            width = width,
            height = height,
            "Preloaded footage pool"
        );

        Self { clips }
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clips(&self) -> &[ClipHandle] {
        &self.clips
    }

    /// Uniformly random clip, `None` if the pool is empty.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ClipHandle> {
        self.clips.choose(rng)
    }

    /// Whether at least one clip can hold a cut of `span` seconds.
    pub fn any_fits(&self, span: f64) -> bool {
        self.clips.iter().any(|c| c.fits(span))
    }
}

impl From<Vec<ClipHandle>> for ClipPool {
    fn from(clips: Vec<ClipHandle>) -> Self {
        Self::new(clips)
    }
}
