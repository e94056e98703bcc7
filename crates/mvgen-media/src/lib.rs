#![deny(unreachable_patterns)]
//! Montage core for beat-synchronized music videos.
//!
//! This crate provides:
//! - Song structure analysis (downbeat window, section intensities, tempo)
//! - Beat-synchronized cut scheduling with uniform or intensity-driven pacing
//! - Composite reduction of rendered takes through an explicit blend graph
//! - Finishing plans for the external encoder
//!
//! Rendering, blending and encoding are done by collaborators behind the
//! [`composite::BlendExecutor`] and [`composite::ArtifactProbe`] traits.

pub mod analysis;
pub mod composite;
pub mod error;
pub mod finishing;
pub mod metrics;
pub mod schedule;

pub use analysis::{
    analyze_downbeats, analyze_structure, classify_intensity, estimate_bpm, AnalysisError,
    DownbeatWindow, Track, TrackStructure,
};
pub use composite::{
    ArtifactProbe, BlendExecutor, BoxError, CompositeGraph, CompositeReducer, FsArtifactProbe,
    ReductionError, ReductionOutcome,
};
pub use error::{MediaError, MediaResult};
pub use finishing::{plan_finishing, FinishingPaths};
pub use schedule::{BeatScheduler, ClipPool, Pacing, SchedulerConfig, SchedulingError, SongTiming};
