//! Edit plan types.

use serde::{Deserialize, Serialize};

use crate::{Pan, Zoom};

/// Why a segment exists in the edit plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SegmentReason {
    /// Plain caption-aligned cut
    #[default]
    Cut,
    /// Isolated emphasis word (zoom 1.05)
    Emphasis,
    /// Mandated visual change to break habituation
    PatternInterrupt,
}

impl SegmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentReason::Cut => "cut",
            SegmentReason::Emphasis => "emphasis",
            SegmentReason::PatternInterrupt => "pattern_interrupt",
        }
    }
}

/// One segment of the edit plan.
///
/// Invariants (validated by the edit gate): segments tile
/// `[0, duration]` within 20 ms (200 ms at the tail), each is at most
/// 3000 ms, zoom deviates from 1.0 only for emphasis segments, and
/// every 2500 ms window contains a pattern interrupt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditSegment {
    pub start_ms: u64,
    pub end_ms: u64,
    /// Visual clip covering `start_ms`
    pub clip_id: String,
    pub zoom: Zoom,
    pub pan: Pan,
    /// Caption reference ("caption_<i>") or synthetic ("silence_<k>")
    pub caption_id: String,
    pub reason: SegmentReason,
}

impl EditSegment {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    pub fn is_silence(&self) -> bool {
        self.caption_id.starts_with("silence_")
    }

    /// Whether the segment intersects `[window_start, window_end)`.
    pub fn intersects(&self, window_start: u64, window_end: u64) -> bool {
        self.start_ms < window_end && self.end_ms > window_start
    }
}

/// A complete per-scene edit plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditPlan {
    pub segments: Vec<EditSegment>,
    /// Audio duration the plan must cover
    pub duration_ms: u64,
}

impl EditPlan {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
