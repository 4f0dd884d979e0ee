//! Deterministic word-level timing synthesis and the audio gate.

use reel_models::{Pacing, WordTimestamp};

use crate::gate::GateReport;

/// Base spoken duration of one word.
const BASE_WORD_MS: f64 = 300.0;
/// Stretch applied to emphasis-trigger words.
const EMPHASIS_STRETCH: f64 = 1.15;
/// Inter-scene pause bounds.
const PAUSE_FRACTION: f64 = 0.15;
const MIN_PAUSE_MS: u64 = 150;
const MAX_PAUSE_MS: u64 = 450;
/// Largest tolerated silence between consecutive words.
const MAX_WORD_GAP_MS: u64 = 600;

/// Lexical emphasis triggers (beyond bare numbers).
const EMPHASIS_WORDS: [&str; 13] = [
    "but", "however", "instead", "secret", "hidden", "mastery", "always", "never", "must",
    "only", "stop", "start", "limit",
];

/// Lower-case a token and strip non-word characters.
pub fn strip_token(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Whether a token triggers emphasis: any number, or a member of the
/// emphasis lexicon.
pub fn is_emphasis_token(word: &str) -> bool {
    let token = strip_token(word);
    if token.is_empty() {
        return false;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    EMPHASIS_WORDS.contains(&token.as_str())
}

/// Timing synthesized for one scene, timestamps starting at 0.
#[derive(Debug, Clone)]
pub struct SceneTiming {
    pub timestamps: Vec<WordTimestamp>,
    /// Duration of the spoken words alone
    pub speech_ms: u64,
    /// Trailing inter-scene pause (0 for the last scene)
    pub pause_ms: u64,
    /// speech_ms + pause_ms; the visual timeline must cover this
    pub duration_ms: u64,
}

/// Duration multiplier for a scene position: hooks run fast, endings
/// linger.
pub fn scene_multiplier(scene_index: usize, scene_count: usize) -> f64 {
    let pacing = Pacing::default();
    if scene_index == 0 {
        pacing.hook_multiplier
    } else if scene_index + 1 == scene_count {
        pacing.ending_multiplier
    } else {
        pacing.body_multiplier
    }
}

/// Assign word-level timestamps for one scene without touching audio.
///
/// The running cursor starts at 0; each word occupies
/// `300 * multiplier` ms, stretched 1.15x for emphasis triggers.
/// Scenes other than the last carry a trailing pause of
/// `clamp(0.15 * speech, 150, 450)` ms.
pub fn synthesize_scene(scene_index: usize, scene_count: usize, text: &str) -> SceneTiming {
    let multiplier = scene_multiplier(scene_index, scene_count);
    let mut cursor: u64 = 0;
    let mut timestamps = Vec::new();

    for raw in text.split_whitespace() {
        let token = strip_token(raw);
        if token.is_empty() {
            continue;
        }
        let emphasis = is_emphasis_token(raw);
        let mut word_ms = BASE_WORD_MS * multiplier;
        if emphasis {
            word_ms *= EMPHASIS_STRETCH;
        }
        let word_ms = word_ms.round() as u64;

        timestamps.push(WordTimestamp {
            word: token,
            start_ms: cursor,
            end_ms: cursor + word_ms,
            emphasis,
        });
        cursor += word_ms;
    }

    let speech_ms = cursor;
    let pause_ms = if scene_index + 1 == scene_count || speech_ms == 0 {
        0
    } else {
        ((speech_ms as f64 * PAUSE_FRACTION).round() as u64).clamp(MIN_PAUSE_MS, MAX_PAUSE_MS)
    };

    SceneTiming {
        timestamps,
        speech_ms,
        pause_ms,
        duration_ms: speech_ms + pause_ms,
    }
}

/// Validate a word timeline: total duration within the target budget,
/// ordered non-overlapping timestamps, no massive silence gaps.
pub fn validate_timeline(
    timestamps: &[WordTimestamp],
    duration_ms: u64,
    target_ms: u64,
) -> GateReport {
    let mut report = GateReport::new();

    let budget = (target_ms as f64 * 1.1) as u64;
    if duration_ms > budget {
        report.reject(format!(
            "Audio runs {}ms, exceeding the {}ms budget",
            duration_ms, budget
        ));
    }

    for pair in timestamps.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.start_ms < prev.end_ms {
            report.reject(format!(
                "Timestamps overlap: '{}' ends at {}ms but '{}' starts at {}ms",
                prev.word, prev.end_ms, next.word, next.start_ms
            ));
        }
        let gap = next.start_ms.saturating_sub(prev.end_ms);
        if gap > MAX_WORD_GAP_MS {
            report.reject(format!("Massive silence gap detected: {}ms", gap));
        }
    }

    for ts in timestamps {
        if ts.end_ms <= ts.start_ms {
            report.reject(format!(
                "Word '{}' has non-positive duration ({}ms..{}ms)",
                ts.word, ts.start_ms, ts.end_ms
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emphasis_lexicon_and_numbers() {
        assert!(is_emphasis_token("but"));
        assert!(is_emphasis_token("Secret!"));
        assert!(is_emphasis_token("42"));
        assert!(!is_emphasis_token("coffee"));
        assert!(!is_emphasis_token("..."));
    }

    #[test]
    fn test_hook_words_run_fast() {
        let timing = synthesize_scene(0, 7, "coffee blocks adenosine");
        assert_eq!(timing.timestamps.len(), 3);
        // 300 * 0.8 = 240ms per plain word
        assert_eq!(timing.timestamps[0].end_ms, 240);
        assert_eq!(timing.timestamps[1].start_ms, 240);
        assert_eq!(timing.speech_ms, 720);
    }

    #[test]
    fn test_ending_words_linger_with_emphasis() {
        let timing = synthesize_scene(6, 7, "never look back");
        // "never" is emphasized: 300 * 1.2 * 1.15 = 414ms
        assert_eq!(timing.timestamps[0].end_ms, 414);
        assert!(timing.timestamps[0].emphasis);
        // plain ending word: 360ms
        assert_eq!(timing.timestamps[1].duration_ms(), 360);
        // last scene has no trailing pause
        assert_eq!(timing.pause_ms, 0);
        assert_eq!(timing.duration_ms, timing.speech_ms);
    }

    #[test]
    fn test_pause_is_clamped() {
        // Two body words: speech 600ms, 0.15 * 600 = 90 -> clamped to 150
        let short = synthesize_scene(2, 7, "two words");
        assert_eq!(short.pause_ms, 150);

        // Long scene: 0.15 * speech caps at 450
        let long_text = vec!["word"; 20].join(" ");
        let long = synthesize_scene(2, 7, &long_text);
        assert_eq!(long.pause_ms, 450);
        assert_eq!(long.duration_ms, long.speech_ms + 450);
    }

    #[test]
    fn test_timestamps_are_contiguous_and_monotonic() {
        let timing = synthesize_scene(3, 7, "the secret is out but nobody knows 42 reasons");
        for pair in timing.timestamps.windows(2) {
            assert_eq!(pair[0].end_ms, pair[1].start_ms);
            assert!(pair[0].start_ms < pair[0].end_ms);
        }
        assert_eq!(
            timing.speech_ms,
            timing.timestamps.last().unwrap().end_ms
        );
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let first = synthesize_scene(1, 7, "coffee hides a secret timer");
        let second = synthesize_scene(1, 7, "coffee hides a secret timer");
        assert_eq!(first.timestamps, second.timestamps);
        assert_eq!(first.duration_ms, second.duration_ms);
    }

    #[test]
    fn test_gate_accepts_valid_timeline() {
        let timing = synthesize_scene(1, 7, "plain body words here");
        let report = validate_timeline(&timing.timestamps, timing.duration_ms, 30_000);
        assert!(report.is_valid());
    }

    #[test]
    fn test_gate_rejects_budget_overrun() {
        let timing = synthesize_scene(1, 7, "one two three four");
        let report = validate_timeline(&timing.timestamps, 40_000, 30_000);
        assert!(report.errors.iter().any(|e| e.contains("budget")));
    }

    #[test]
    fn test_gate_rejects_massive_gap() {
        let timestamps = vec![
            WordTimestamp {
                word: "a".into(),
                start_ms: 0,
                end_ms: 300,
                emphasis: false,
            },
            WordTimestamp {
                word: "b".into(),
                start_ms: 1000,
                end_ms: 1300,
                emphasis: false,
            },
        ];
        let report = validate_timeline(&timestamps, 1300, 30_000);
        assert!(report
            .errors
            .contains(&"Massive silence gap detected: 700ms".to_string()));
    }

    #[test]
    fn test_gate_rejects_overlap() {
        let timestamps = vec![
            WordTimestamp {
                word: "a".into(),
                start_ms: 0,
                end_ms: 300,
                emphasis: false,
            },
            WordTimestamp {
                word: "b".into(),
                start_ms: 200,
                end_ms: 500,
                emphasis: false,
            },
        ];
        let report = validate_timeline(&timestamps, 500, 30_000);
        assert!(report.errors.iter().any(|e| e.contains("overlap")));
    }
}
