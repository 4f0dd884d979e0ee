//! Caption segments produced by the grouper.

use serde::{Deserialize, Serialize};

/// Static rendering style applied to every caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    pub font_size: u32,
    pub color: String,
    pub emphasis_color: String,
    pub shadow_offset: (i32, i32),
    /// Font size multiplier for emphasis captions
    pub emphasis_scale: f64,
    /// Pixels above the bottom edge
    pub bottom_margin: u32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 72,
            color: "white".to_string(),
            emphasis_color: "gold".to_string(),
            shadow_offset: (2, 2),
            emphasis_scale: 1.1,
            bottom_margin: 60,
        }
    }
}

/// One on-screen caption: 1-3 words shown for at most 900 ms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Caption {
    /// 1-3 words joined by single spaces
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Indices (0..word_count) of emphasized words within `text`
    #[serde(default)]
    pub emphasis_indices: Vec<usize>,
    #[serde(default)]
    pub style: CaptionStyle,
}

impl Caption {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn word_count(&self) -> usize {
        self.text.split(' ').count()
    }

    pub fn has_emphasis(&self) -> bool {
        !self.emphasis_indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caption_accessors() {
        let caption = Caption {
            text: "a b c".to_string(),
            start_ms: 0,
            end_ms: 900,
            emphasis_indices: vec![1],
            style: CaptionStyle::default(),
        };
        assert_eq!(caption.duration_ms(), 900);
        assert_eq!(caption.word_count(), 3);
        assert!(caption.has_emphasis());
    }

    #[test]
    fn test_default_style() {
        let style = CaptionStyle::default();
        assert_eq!(style.color, "white");
        assert_eq!(style.emphasis_color, "gold");
        assert_eq!(style.shadow_offset, (2, 2));
    }
}
