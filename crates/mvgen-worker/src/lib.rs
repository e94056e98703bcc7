//! Music video generation worker.
//!
//! This crate provides:
//! - Environment-driven configuration
//! - Raw PCM and clip manifest loading
//! - Parallel take scheduling and bounded rendering
//! - The planning pipeline and a full run with injected collaborators
//! - Structured run logging

pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod pcm;
pub mod pipeline;
pub mod takes;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::RunLogger;
pub use manifest::ClipManifest;
pub use pcm::load_pcm_f32le;
pub use pipeline::{Pipeline, PlanOutcome, RunOutcome};
pub use takes::{discover_takes, take_leaves, TakeGenerator, TakeRenderer, TakeRequest};
