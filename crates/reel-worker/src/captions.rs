//! Caption grouping and validation.

use reel_models::{Caption, CaptionStyle, WordTimestamp};

use crate::gate::GateReport;

/// Maximum words per caption group.
const MAX_GROUP_WORDS: usize = 3;
/// A group stops growing once its span passes this.
const MAX_GROWTH_MS: u64 = 800;
/// Hard cap on a finished caption's duration.
const MAX_CAPTION_MS: u64 = 900;
/// Tail slack allowed past the audio duration.
const TAIL_SLACK_MS: u64 = 100;

/// Greedy left-to-right grouping of word timings into captions.
///
/// A new group starts when the current one already holds three
/// words, when its span has grown past 800 ms, or when taking the
/// next word would push the span past the 900 ms display cap.
/// Emphasis indices are re-based to positions within the group.
pub fn group_captions(timestamps: &[WordTimestamp]) -> Vec<Caption> {
    let mut captions = Vec::new();
    let mut group: Vec<&WordTimestamp> = Vec::new();

    let flush = |group: &mut Vec<&WordTimestamp>, captions: &mut Vec<Caption>| {
        if group.is_empty() {
            return;
        }
        captions.push(Caption {
            text: group
                .iter()
                .map(|w| w.word.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            start_ms: group.first().unwrap().start_ms,
            end_ms: group.last().unwrap().end_ms,
            emphasis_indices: group
                .iter()
                .enumerate()
                .filter(|(_, w)| w.emphasis)
                .map(|(i, _)| i)
                .collect(),
            style: CaptionStyle::default(),
        });
        group.clear();
    };

    for word in timestamps {
        if let Some(first) = group.first() {
            let grown_past = word.start_ms.saturating_sub(first.start_ms) > MAX_GROWTH_MS;
            let would_exceed_cap = word.end_ms.saturating_sub(first.start_ms) > MAX_CAPTION_MS;
            if group.len() >= MAX_GROUP_WORDS || grown_past || would_exceed_cap {
                flush(&mut group, &mut captions);
            }
        }
        group.push(word);
    }
    flush(&mut group, &mut captions);

    captions
}

/// Validate a caption timeline against the audio it annotates.
pub fn validate_captions(captions: &[Caption], audio_duration_ms: u64) -> GateReport {
    let mut report = GateReport::new();

    for (index, caption) in captions.iter().enumerate() {
        if caption.word_count() > MAX_GROUP_WORDS {
            report.reject(format!(
                "Caption {} has {} words (max {})",
                index,
                caption.word_count(),
                MAX_GROUP_WORDS
            ));
        }
        if caption.duration_ms() > MAX_CAPTION_MS {
            report.reject(format!(
                "Caption {} lasts {}ms (max {}ms)",
                index,
                caption.duration_ms(),
                MAX_CAPTION_MS
            ));
        }
        let words = caption.word_count();
        if caption.emphasis_indices.iter().any(|&i| i >= words) {
            report.reject(format!("Caption {} has out-of-range emphasis index", index));
        }
    }

    for pair in captions.windows(2) {
        if pair[1].start_ms < pair[0].end_ms {
            report.reject(format!(
                "Captions overlap at {}ms",
                pair[1].start_ms
            ));
        }
    }

    if let Some(last) = captions.last() {
        if last.end_ms > audio_duration_ms + TAIL_SLACK_MS {
            report.reject(format!(
                "Last caption ends at {}ms, past audio end {}ms",
                last.end_ms, audio_duration_ms
            ));
        }
    }

    report
}
