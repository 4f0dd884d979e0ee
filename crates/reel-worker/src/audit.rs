//! Final GO/NO-GO quality audit.

use reel_models::{Script, WordTimestamp};
use tracing::info;

use crate::script_gate::matches_curiosity_pattern;

/// Words that grab attention inside the first two seconds.
const HOOK_GRAB_WORDS: [&str; 7] = ["but", "wrong", "lie", "secret", "nobody", "stop", "failed"];

/// Stance lexicon: the video must take a side somewhere.
const STANCE_WORDS: [&str; 7] = ["isnt", "is not", "problem", "truth", "lies", "failed", "shouldnt"];

/// Polite-conclusion markers banned from the ending.
const POLITE_ENDINGS: [&str; 5] = [
    "summary",
    "conclude",
    "in conclusion",
    "thank you",
    "follow for more",
];

/// Pacing-uniformity parameters: consecutive 5-word windows whose
/// words-per-second differ by less than 0.2 accumulate; over 4
/// seconds of that is a NO-GO.
const WINDOW_WORDS: usize = 5;
const WPS_DELTA: f64 = 0.2;
const MAX_UNIFORM_MS: u64 = 4000;

/// Audit outcome with every NO-GO reason that fired.
#[derive(Debug, Clone)]
pub struct AuditVerdict {
    pub failures: Vec<String>,
}

impl AuditVerdict {
    pub fn is_go(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Normalize text for lexicon checks: lower-case, apostrophes
/// stripped so "isn't" matches "isnt".
fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\''], "")
}

/// A1: the hook must grab within two seconds.
fn check_hook_grab(hook: &str) -> bool {
    let normalized = normalize(hook);
    HOOK_GRAB_WORDS.iter().any(|w| normalized.contains(w)) || matches_curiosity_pattern(hook)
}

/// A2: sliding 5-word windows with stride 5; accumulate the duration
/// of windows whose pace matches the previous one.
fn uniform_pacing_ms(timestamps: &[WordTimestamp]) -> u64 {
    let mut windows = Vec::new();
    let mut i = 0;
    while i + WINDOW_WORDS <= timestamps.len() {
        let chunk = &timestamps[i..i + WINDOW_WORDS];
        let span_ms = chunk[WINDOW_WORDS - 1].end_ms - chunk[0].start_ms;
        if span_ms > 0 {
            windows.push((span_ms, WINDOW_WORDS as f64 / (span_ms as f64 / 1000.0)));
        }
        i += WINDOW_WORDS;
    }

    let mut worst: u64 = 0;
    let mut accumulated: u64 = 0;
    for pair in windows.windows(2) {
        let ((_, prev_wps), (span_ms, wps)) = (pair[0], pair[1]);
        if (wps - prev_wps).abs() < WPS_DELTA {
            accumulated += span_ms;
            worst = worst.max(accumulated);
        } else {
            accumulated = 0;
        }
    }
    worst
}

/// A3: the combined script text must carry at least one stance word.
fn check_stance(script: &Script) -> bool {
    let normalized = normalize(&script.full_text());
    STANCE_WORDS.iter().any(|w| normalized.contains(w))
}

/// A4: the ending must not read as a polite conclusion.
fn check_ending(ending: &str) -> bool {
    let normalized = normalize(ending);
    !POLITE_ENDINGS
        .iter()
        .any(|phrase| normalized.contains(&normalize(phrase)))
}

/// Run the full audit over the script and the aggregated word
/// timeline.
pub fn run_audit(script: &Script, timestamps: &[WordTimestamp]) -> AuditVerdict {
    let mut failures = Vec::new();

    let hook = script.hook().unwrap_or_default();
    if !check_hook_grab(hook) {
        failures.push("First 2 seconds feel skippable".to_string());
    }

    let uniform = uniform_pacing_ms(timestamps);
    if uniform > MAX_UNIFORM_MS {
        failures.push("Pacing feels uniform".to_string());
    }

    if !check_stance(script) {
        failures.push("Video feels neutral and safe".to_string());
    }

    let ending = script.ending().unwrap_or_default();
    if !check_ending(ending) {
        failures.push(
            "Video feels complete/polite instead of intentionally unfinished".to_string(),
        );
    }

    if failures.is_empty() {
        info!("Audit verdict: GO");
    } else {
        info!(reasons = ?failures, "Audit verdict: NO-GO");
    }
    AuditVerdict { failures }
}
