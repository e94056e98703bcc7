//! Section intensity models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Loudness of a 4-bar section relative to the loudest section of the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum IntensityLevel {
    Low,
    Medium,
    High,
}

impl IntensityLevel {
    /// Fraction of the track maximum at or above which a section is High.
    pub const HIGH_RATIO: f64 = 0.96;
    /// Fraction of the track maximum at or above which a section is Medium.
    pub const MEDIUM_RATIO: f64 = 0.65;

    /// Classify a section mean against the track maximum.
    pub fn classify(mean: f64, max_mean: f64) -> Self {
        if mean >= Self::HIGH_RATIO * max_mean {
            IntensityLevel::High
        } else if mean >= Self::MEDIUM_RATIO * max_mean {
            IntensityLevel::Medium
        } else {
            IntensityLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityLevel::Low => "Low",
            IntensityLevel::Medium => "Medium",
            IntensityLevel::High => "High",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One 16-beat block of the analyzed window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntensitySegment {
    /// Position in musical order, starting at 0.
    pub index: usize,
    /// Mean absolute amplitude over the block.
    pub mean_amplitude: f64,
    pub level: IntensityLevel,
}

/// A row of the per-section intensity export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IntensityRow {
    pub section: usize,
    pub intensity: IntensityLevel,
}

/// Exportable per-section intensities, ordered by section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct IntensityReport {
    pub rows: Vec<IntensityRow>,
}

impl IntensityReport {
    pub fn from_segments(segments: &[IntensitySegment]) -> Self {
        let mut rows: Vec<IntensityRow> = segments
            .iter()
            .map(|s| IntensityRow {
                section: s.index,
                intensity: s.level,
            })
            .collect();
        rows.sort_by_key(|r| r.section);
        Self { rows }
    }

    /// Levels in section order.
    pub fn levels(&self) -> Vec<IntensityLevel> {
        self.rows.iter().map(|r| r.intensity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_thresholds() {
        assert_eq!(IntensityLevel::classify(1.0, 1.0), IntensityLevel::High);
        assert_eq!(IntensityLevel::classify(0.96, 1.0), IntensityLevel::High);
        assert_eq!(IntensityLevel::classify(0.95, 1.0), IntensityLevel::Medium);
        assert_eq!(IntensityLevel::classify(0.65, 1.0), IntensityLevel::Medium);
        assert_eq!(IntensityLevel::classify(0.64, 1.0), IntensityLevel::Low);
    }

    #[test]
    fn test_level_serializes_capitalized() {
        let json = serde_json::to_string(&IntensityLevel::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }

    #[test]
    fn test_report_orders_by_section() {
        let segments = vec![
            IntensitySegment {
                index: 1,
                mean_amplitude: 0.9,
                level: IntensityLevel::High,
            },
            IntensitySegment {
                index: 0,
                mean_amplitude: 0.2,
                level: IntensityLevel::Low,
            },
        ];
        let report = IntensityReport::from_segments(&segments);
        assert_eq!(report.rows[0].section, 0);
        assert_eq!(
            report.levels(),
            vec![IntensityLevel::Low, IntensityLevel::High]
        );
    }
}
