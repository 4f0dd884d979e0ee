//! Visual timeline types: stock assets, clips and transforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Zoom factor applied to a clip or edit segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Zoom {
    /// 1.0 (no zoom)
    #[default]
    None,
    /// 1.05
    Subtle,
    /// 1.10
    Strong,
}

impl Zoom {
    pub fn factor(&self) -> f64 {
        match self {
            Zoom::None => 1.0,
            Zoom::Subtle => 1.05,
            Zoom::Strong => 1.10,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Zoom::None)
    }
}

/// Pan direction for the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pan {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

/// All pan directions in canonical order; index 0 is `None`.
pub const PANS: [Pan; 5] = [Pan::None, Pan::Left, Pan::Right, Pan::Up, Pan::Down];

impl Pan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pan::None => "none",
            Pan::Left => "left",
            Pan::Right => "right",
            Pan::Up => "up",
            Pan::Down => "down",
        }
    }
}

impl fmt::Display for Pan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Zoom + pan pair applied to a visual clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Transform {
    pub zoom: Zoom,
    pub pan: Pan,
}

/// A stock footage asset known to the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAsset {
    /// Globally unique asset ID (provider-prefixed)
    pub id: String,
    /// Provider name ("pexels", "mock")
    pub provider: String,
    /// Remote download URL; `None` for mock placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Set when the asset was handed out again under supply shortage
    #[serde(default)]
    pub reused: bool,
}

/// One clip placed on a scene's visual timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualClip {
    /// Globally unique clip ID
    pub clip_id: String,
    /// Source provider name
    pub provider: String,
    /// Local file backing the clip
    pub local_path: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// The keyword that selected this clip
    pub keyword: String,
    pub transform: Transform,
}

impl VisualClip {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Whether `t_ms` falls inside `[start_ms, end_ms)`.
    pub fn covers(&self, t_ms: u64) -> bool {
        t_ms >= self.start_ms && t_ms < self.end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_factors() {
        assert!((Zoom::None.factor() - 1.0).abs() < f64::EPSILON);
        assert!((Zoom::Subtle.factor() - 1.05).abs() < f64::EPSILON);
        assert!((Zoom::Strong.factor() - 1.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pans_order() {
        assert_eq!(PANS[0], Pan::None);
        assert_eq!(PANS.len(), 5);
    }

    #[test]
    fn test_clip_coverage() {
        let clip = VisualClip {
            clip_id: "pexels_42".to_string(),
            provider: "pexels".to_string(),
            local_path: "/assets/clips/pexels_42.mp4".to_string(),
            start_ms: 1000,
            end_ms: 2500,
            keyword: "coffee".to_string(),
            transform: Transform::default(),
        };
        assert_eq!(clip.duration_ms(), 1500);
        assert!(clip.covers(1000));
        assert!(clip.covers(2499));
        assert!(!clip.covers(2500));
        assert!(!clip.covers(999));
    }
}
