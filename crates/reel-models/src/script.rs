//! Script and scene definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A script is always exactly seven scenes: hook, five bodies, ending.
pub const SCENE_COUNT: usize = 7;

/// Position-derived role of a scene within the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SceneKind {
    #[serde(rename = "hook")]
    Hook,
    #[serde(rename = "body_1")]
    Body1,
    #[serde(rename = "body_2")]
    Body2,
    #[serde(rename = "body_3")]
    Body3,
    #[serde(rename = "body_4")]
    Body4,
    #[serde(rename = "body_5")]
    Body5,
    #[serde(rename = "ending")]
    Ending,
}

impl SceneKind {
    /// All kinds in script order.
    pub const ORDERED: [SceneKind; SCENE_COUNT] = [
        SceneKind::Hook,
        SceneKind::Body1,
        SceneKind::Body2,
        SceneKind::Body3,
        SceneKind::Body4,
        SceneKind::Body5,
        SceneKind::Ending,
    ];

    /// The kind expected at a given scene index.
    pub fn for_index(index: usize) -> Option<SceneKind> {
        Self::ORDERED.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneKind::Hook => "hook",
            SceneKind::Body1 => "body_1",
            SceneKind::Body2 => "body_2",
            SceneKind::Body3 => "body_3",
            SceneKind::Body4 => "body_4",
            SceneKind::Body5 => "body_5",
            SceneKind::Ending => "ending",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scene of the script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene role
    #[serde(rename = "type")]
    pub kind: SceneKind,
    /// Spoken narration text
    pub text: String,
    /// 2-3 concrete lower-case nouns/actions used for stock search
    pub keywords: Vec<String>,
}

impl Scene {
    /// Number of whitespace-separated words in the narration.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// An ordered seven-scene script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub scenes: Vec<Scene>,
}

impl Script {
    /// The opening scene text, if present.
    pub fn hook(&self) -> Option<&str> {
        self.scenes.first().map(|s| s.text.as_str())
    }

    /// The final scene text, if present.
    pub fn ending(&self) -> Option<&str> {
        self.scenes.last().map(|s| s.text.as_str())
    }

    /// All scene texts joined for lexicon checks.
    pub fn full_text(&self) -> String {
        self.scenes
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_kind_ordering() {
        assert_eq!(SceneKind::for_index(0), Some(SceneKind::Hook));
        assert_eq!(SceneKind::for_index(3), Some(SceneKind::Body3));
        assert_eq!(SceneKind::for_index(6), Some(SceneKind::Ending));
        assert_eq!(SceneKind::for_index(7), None);
    }

    #[test]
    fn test_scene_kind_serde() {
        let json = serde_json::to_string(&SceneKind::Body2).unwrap();
        assert_eq!(json, "\"body_2\"");
        let parsed: SceneKind = serde_json::from_str("\"ending\"").unwrap();
        assert_eq!(parsed, SceneKind::Ending);
    }

    #[test]
    fn test_script_hook_and_ending() {
        let script = Script {
            scenes: SceneKind::ORDERED
                .iter()
                .map(|kind| Scene {
                    kind: *kind,
                    text: format!("text for {}", kind),
                    keywords: vec!["coffee".into(), "beans".into()],
                })
                .collect(),
        };
        assert_eq!(script.hook(), Some("text for hook"));
        assert_eq!(script.ending(), Some("text for ending"));
        assert!(script.full_text().contains("body_3"));
    }

    #[test]
    fn test_scene_word_count() {
        let scene = Scene {
            kind: SceneKind::Hook,
            text: "Most people think coffee wakes you".to_string(),
            keywords: vec!["coffee".into()],
        };
        assert_eq!(scene.word_count(), 6);
    }
}
