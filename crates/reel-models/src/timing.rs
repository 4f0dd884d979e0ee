//! Word-level audio timing model.

use serde::{Deserialize, Serialize};

/// Timestamp for a single spoken word.
///
/// Invariant across a timeline: timestamps are monotonically
/// non-decreasing and non-overlapping (`end_ms <= next.start_ms`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTimestamp {
    /// The stripped token
    pub word: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Word carries lexical emphasis (timing stretch + zoom downstream)
    #[serde(default)]
    pub emphasis: bool,
}

impl WordTimestamp {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Per-section duration multipliers applied by the timing synth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pacing {
    pub hook_multiplier: f64,
    pub body_multiplier: f64,
    pub ending_multiplier: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            hook_multiplier: 0.8,
            body_multiplier: 1.0,
            ending_multiplier: 1.2,
        }
    }
}

/// Output of audio synthesis for one scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioResult {
    /// Path to the synthesized WAV/MP3 on disk
    pub audio_path: String,
    /// Ordered word timestamps
    pub timestamps: Vec<WordTimestamp>,
    /// Total scene duration in milliseconds
    pub duration_ms: u64,
    /// Multipliers used by the synth
    pub pacing: Pacing,
}

impl AudioResult {
    /// Largest inter-word silence in the timeline.
    pub fn max_gap_ms(&self) -> u64 {
        self.timestamps
            .windows(2)
            .map(|w| w[1].start_ms.saturating_sub(w[0].end_ms))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(word: &str, start_ms: u64, end_ms: u64) -> WordTimestamp {
        WordTimestamp {
            word: word.to_string(),
            start_ms,
            end_ms,
            emphasis: false,
        }
    }

    #[test]
    fn test_word_duration() {
        assert_eq!(word("hello", 100, 400).duration_ms(), 300);
    }

    #[test]
    fn test_max_gap() {
        let audio = AudioResult {
            audio_path: "/tmp/a.wav".to_string(),
            timestamps: vec![word("a", 0, 300), word("b", 450, 750), word("c", 760, 1060)],
            duration_ms: 1060,
            pacing: Pacing::default(),
        };
        assert_eq!(audio.max_gap_ms(), 150);
    }

    #[test]
    fn test_default_pacing() {
        let pacing = Pacing::default();
        assert!((pacing.hook_multiplier - 0.8).abs() < f64::EPSILON);
        assert!((pacing.ending_multiplier - 1.2).abs() < f64::EPSILON);
    }
}
