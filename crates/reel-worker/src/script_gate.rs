//! Structural quality gate for generated scripts.

use std::sync::LazyLock;

use regex::Regex;

use reel_models::{SceneKind, Script, SCENE_COUNT};

use crate::gate::GateReport;

const MAX_HOOK_WORDS: usize = 12;
const MAX_ENDING_WORDS: usize = 8;
const MIN_KEYWORDS: usize = 2;
const MAX_KEYWORDS: usize = 3;

/// Openers that kill retention before the first cut.
const BANNED_HOOK_PHRASES: [&str; 4] = [
    "did you know",
    "in this video",
    "let's talk about",
    "you won't believe",
];

/// The four curiosity patterns a hook must satisfy.
pub static CURIOSITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // "most people think ..., but ..."
        Regex::new(r"(?i)\b(most|many|some)\s+(people|thinkers|experts)\s+think\b.*\bbut\b")
            .unwrap(),
        // "nobody tells you this about ..."
        Regex::new(r"(?i)\bnobody\s+(tells|told|is\s+telling)\s+you\s+this\s+about\b").unwrap(),
        // "this sounds wrong, but ..."
        Regex::new(r"(?i)\bthis\s+sounds\s+wrong,?\s+but\b").unwrap(),
        // "... isn't the problem. ... is."
        Regex::new(r"(?i)\b(isn't|is\s+not)\s+the\s+problem\..*\bis\.").unwrap(),
    ]
});

/// Whether `text` matches at least one curiosity pattern.
pub fn matches_curiosity_pattern(text: &str) -> bool {
    CURIOSITY_PATTERNS.iter().any(|p| p.is_match(text))
}

/// Validate a script's structure: scene count and ordering, keyword
/// shape, hook and ending constraints.
pub fn validate_script(script: &Script) -> GateReport {
    let mut report = GateReport::new();

    if script.scenes.len() != SCENE_COUNT {
        report.reject(format!(
            "Script must have exactly {} scenes, got {}",
            SCENE_COUNT,
            script.scenes.len()
        ));
        return report;
    }

    for (index, scene) in script.scenes.iter().enumerate() {
        let expected = SceneKind::for_index(index).unwrap();
        if scene.kind != expected {
            report.reject(format!(
                "Scene {} must be {}, got {}",
                index, expected, scene.kind
            ));
        }
        if scene.text.trim().is_empty() {
            report.reject(format!("Scene {} has empty text", index));
        }
        if scene.keywords.len() < MIN_KEYWORDS || scene.keywords.len() > MAX_KEYWORDS {
            report.reject(format!(
                "Scene {} must have {}-{} keywords, got {}",
                index,
                MIN_KEYWORDS,
                MAX_KEYWORDS,
                scene.keywords.len()
            ));
        }
        for keyword in &scene.keywords {
            if keyword.chars().any(|c| c.is_uppercase()) {
                report.reject(format!(
                    "Scene {} keyword '{}' must be lower-case",
                    index, keyword
                ));
            }
        }
    }
    if !report.is_valid() {
        return report;
    }

    let hook = script.hook().unwrap_or_default();
    let hook_words = hook.split_whitespace().count();
    if hook_words > MAX_HOOK_WORDS {
        report.reject(format!(
            "Hook must be at most {} words, got {}",
            MAX_HOOK_WORDS, hook_words
        ));
    }

    let hook_lower = hook.to_lowercase();
    for phrase in BANNED_HOOK_PHRASES {
        if hook_lower.contains(phrase) {
            report.reject(format!("Hook contains banned phrase \"{}\"", phrase));
        }
    }

    if !matches_curiosity_pattern(hook) {
        report.reject("Hook matches none of the curiosity patterns".to_string());
    }

    let ending = script.ending().unwrap_or_default();
    let ending_words = ending.split_whitespace().count();
    if ending_words > MAX_ENDING_WORDS {
        report.reject(format!(
            "Ending must be at most {} words, got {}",
            MAX_ENDING_WORDS, ending_words
        ));
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::Scene;

    fn script_with_hook_and_ending(hook: &str, ending: &str) -> Script {
        Script {
            scenes: SceneKind::ORDERED
                .iter()
                .enumerate()
                .map(|(i, kind)| Scene {
                    kind: *kind,
                    text: match kind {
                        SceneKind::Hook => hook.to_string(),
                        SceneKind::Ending => ending.to_string(),
                        _ => format!("Body text for scene {}", i),
                    },
                    keywords: vec!["coffee".into(), "cup".into()],
                })
                .collect(),
        }
    }

    #[test]
    fn test_accepts_pattern_one_hook() {
        let script = script_with_hook_and_ending(
            "Most people think coffee wakes you, but it blocks adenosine",
            "Try it tomorrow morning",
        );
        assert!(validate_script(&script).is_valid());
    }

    #[test]
    fn test_rejects_banned_phrase() {
        let script = script_with_hook_and_ending(
            "In this video we explain coffee",
            "Try it tomorrow",
        );
        let report = validate_script(&script);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("in this video")));
    }

    #[test]
    fn test_rejects_patternless_hook() {
        let script =
            script_with_hook_and_ending("Coffee is a popular drink", "Try it tomorrow");
        let report = validate_script(&script);
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("curiosity patterns")));
    }

    #[test]
    fn test_rejects_long_hook() {
        let script = script_with_hook_and_ending(
            "Most people think coffee wakes you up every single day, but actually it truly does not",
            "Try it tomorrow",
        );
        let report = validate_script(&script);
        assert!(report.errors.iter().any(|e| e.contains("at most 12 words")));
    }

    #[test]
    fn test_rejects_long_ending() {
        let script = script_with_hook_and_ending(
            "This sounds wrong, but caffeine borrows energy",
            "And that is why you should never drink coffee again",
        );
        let report = validate_script(&script);
        assert!(report.errors.iter().any(|e| e.contains("at most 8 words")));
    }

    #[test]
    fn test_rejects_wrong_scene_count() {
        let mut script = script_with_hook_and_ending(
            "This sounds wrong, but caffeine borrows energy",
            "Try it tomorrow",
        );
        script.scenes.pop();
        let report = validate_script(&script);
        assert!(report.errors.iter().any(|e| e.contains("exactly 7 scenes")));
    }

    #[test]
    fn test_rejects_uppercase_keywords() {
        let mut script = script_with_hook_and_ending(
            "This sounds wrong, but caffeine borrows energy",
            "Try it tomorrow",
        );
        script.scenes[2].keywords = vec!["Coffee".into(), "cup".into()];
        let report = validate_script(&script);
        assert!(report.errors.iter().any(|e| e.contains("lower-case")));
    }

    #[test]
    fn test_curiosity_patterns() {
        assert!(matches_curiosity_pattern(
            "Nobody tells you this about sleep"
        ));
        assert!(matches_curiosity_pattern("This sounds wrong, but it works"));
        assert!(matches_curiosity_pattern(
            "Caffeine isn't the problem. Timing is."
        ));
        assert!(!matches_curiosity_pattern("A calm statement about coffee"));
    }
}
