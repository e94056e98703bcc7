//! Shared data models for the music video generator.
//!
//! This crate provides Serde-serializable types for:
//! - Source clips and their looks
//! - Cut instructions and per-take render plans
//! - Section intensity levels and reports
//! - Reduction and finishing plans consumed by the external encoder
//! - Deterministic artifact naming

pub mod artifact;
pub mod clip;
pub mod composite;
pub mod cut;
pub mod intensity;
pub mod mode;

// Re-export common types
pub use artifact::{ArtifactNames, TAKE_MARKER};
pub use clip::{ClipHandle, ClipId, ClipSource, ClipVariant};
pub use composite::{BlendMode, BlendStep, FinishStep, FinishingPlan, ReductionPlan};
pub use cut::{Cut, CutEffect, RenderPlan};
pub use intensity::{IntensityLevel, IntensityReport, IntensityRow, IntensitySegment};
pub use mode::{ParseModeError, SchedulingMode};
