//! Scheduling mode selection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How cut rates are chosen for a take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// Rates drawn independently of the music.
    Simple,
    /// Rates follow section intensity; faster visuals on intense sections.
    #[default]
    Smart,
}

impl SchedulingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingMode::Simple => "simple",
            SchedulingMode::Smart => "smart",
        }
    }

    /// Whether this mode needs per-section intensities.
    pub fn needs_intensity(&self) -> bool {
        matches!(self, SchedulingMode::Smart)
    }
}

impl fmt::Display for SchedulingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unrecognized scheduling mode string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown scheduling mode: {0}")]
pub struct ParseModeError(pub String);

impl FromStr for SchedulingMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "simple_vid" | "uniform" => Ok(SchedulingMode::Simple),
            "smart" | "smart_vid" | "dynamic" => Ok(SchedulingMode::Smart),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
