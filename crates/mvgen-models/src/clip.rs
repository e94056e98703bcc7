//! Source clip models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Identifier of a clip inside a caller-provided pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClipId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which pool a cut draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipSource {
    /// Raw footage used by the main loop.
    #[default]
    Footage,
    /// Ambient title footage used for intro/outro padding.
    Title,
}

/// Look applied to a footage clip for its whole lifetime in a run.
///
/// Assigned once when the pool is preloaded so repeated appearances of the
/// same clip look different from other clips. The renderer owns the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipVariant {
    #[default]
    Original,
    /// Green and blue channels swapped.
    SwapGreenBlue,
    /// Horizontally mirrored.
    MirrorX,
    /// Green/blue swap plus vertical mirror.
    SwapGreenBlueMirrorY,
}

impl ClipVariant {
    /// Pick a variant from a uniform draw in `[0, 1)`.
    ///
    /// Weights: 0.3 / 0.3 / 0.3 / 0.1.
    pub fn from_unit(draw: f64) -> Self {
        if draw < 0.3 {
            ClipVariant::Original
        } else if draw < 0.6 {
            ClipVariant::SwapGreenBlue
        } else if draw < 0.9 {
            ClipVariant::MirrorX
        } else {
            ClipVariant::SwapGreenBlueMirrorY
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClipVariant::Original => "original",
            ClipVariant::SwapGreenBlue => "swap_green_blue",
            ClipVariant::MirrorX => "mirror_x",
            ClipVariant::SwapGreenBlueMirrorY => "swap_green_blue_mirror_y",
        }
    }
}

impl fmt::Display for ClipVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A clip the scheduler may cut from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipHandle {
    pub id: ClipId,
    /// Location of the media, opaque to the scheduler.
    pub path: PathBuf,
    /// Duration in seconds.
    pub duration: f64,
    /// Frame width in pixels, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height in pixels, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default)]
    pub variant: ClipVariant,
}

impl ClipHandle {
    /// Create a handle with unknown frame size.
    pub fn new(id: impl Into<ClipId>, path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            duration,
            width: None,
            height: None,
            variant: ClipVariant::Original,
        }
    }

    /// Builder-style setter for frame size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Builder-style setter for the variant.
    pub fn with_variant(mut self, variant: ClipVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Whether a cut of `span` seconds fits inside this clip.
    pub fn fits(&self, span: f64) -> bool {
        self.duration >= span
    }

    /// Whether the frame is larger than `width` x `height` in either axis.
    ///
    /// Clips with unknown size are never considered oversized.
    pub fn exceeds_frame(&self, width: u32, height: u32) -> bool {
        match (self.width, self.height) {
            (Some(w), Some(h)) => w > width || h > height,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_unit_boundaries() {
        assert_eq!(ClipVariant::from_unit(0.0), ClipVariant::Original);
        assert_eq!(ClipVariant::from_unit(0.3), ClipVariant::SwapGreenBlue);
        assert_eq!(ClipVariant::from_unit(0.6), ClipVariant::MirrorX);
        assert_eq!(ClipVariant::from_unit(0.95), ClipVariant::SwapGreenBlueMirrorY);
    }

    #[test]
    fn test_fits() {
        let clip = ClipHandle::new("a", "/clips/a.mp4", 4.0);
        assert!(clip.fits(4.0));
        assert!(clip.fits(0.5));
        assert!(!clip.fits(4.01));
    }

    #[test]
    fn test_exceeds_frame() {
        let clip = ClipHandle::new("a", "/clips/a.mp4", 4.0).with_size(3840, 2160);
        assert!(clip.exceeds_frame(1920, 1080));
        assert!(!clip.exceeds_frame(3840, 2160));

        let unknown = ClipHandle::new("b", "/clips/b.mp4", 4.0);
        assert!(!unknown.exceeds_frame(1, 1));
    }

    #[test]
    fn test_clip_id_serializes_transparently() {
        let json = serde_json::to_string(&ClipId::from("sea_01")).unwrap();
        assert_eq!(json, "\"sea_01\"");
    }
}
