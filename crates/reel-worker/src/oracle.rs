//! Script oracle adapters.
//!
//! The language model is an external collaborator: the adapter shapes
//! the prompt, enforces pacing between calls, rotates API keys on
//! rate limits and strictly parses the JSON response into a
//! [`Script`]. A deterministic canned script is the last resort when
//! every remote oracle fails and fallback is permitted.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use reel_models::{Scene, SceneKind, Script, Tone};

use crate::error::{WorkerError, WorkerResult};
use crate::retry::RetryConfig;

/// Capability interface over a text -> script oracle.
#[async_trait]
pub trait ScriptOracle: Send + Sync {
    async fn generate_script(
        &self,
        topic: &str,
        duration_seconds: u32,
        tone: Tone,
    ) -> WorkerResult<Script>;
}

/// Whether the router may fall back to the canned script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    Allowed,
    Forbidden,
}

// ============================================================================
// Prompt + response shaping
// ============================================================================

/// JSON shape demanded from every oracle.
#[derive(Debug, Deserialize)]
struct ScriptResponse {
    scenes: Vec<SceneResponse>,
}

#[derive(Debug, Deserialize)]
struct SceneResponse {
    #[serde(rename = "type")]
    kind: SceneKind,
    text: String,
    keywords: Vec<String>,
}

fn build_prompt(topic: &str, duration_seconds: u32, tone: Tone) -> String {
    format!(
        r#"Write a short-form vertical video script about: {topic}

Target length: {duration_seconds} seconds of narration, {tone} tone.

Return ONLY a single JSON object with this schema:
{{
  "scenes": [
    {{"type": "hook", "text": "...", "keywords": ["...", "..."]}},
    {{"type": "body_1", "text": "...", "keywords": ["...", "..."]}},
    {{"type": "body_2", "text": "...", "keywords": ["...", "..."]}},
    {{"type": "body_3", "text": "...", "keywords": ["...", "..."]}},
    {{"type": "body_4", "text": "...", "keywords": ["...", "..."]}},
    {{"type": "body_5", "text": "...", "keywords": ["...", "..."]}},
    {{"type": "ending", "text": "...", "keywords": ["...", "..."]}}
  ]
}}

Rules:
- Exactly 7 scenes in the order above.
- The hook is at most 12 words, avoids cliches like "did you know",
  and opens a curiosity gap ("most people think X, but Y",
  "nobody tells you this about X", "this sounds wrong, but",
  "X isn't the problem. Y is.").
- The ending is at most 8 words and must NOT summarize or thank the
  viewer; leave the thought unfinished.
- Each scene carries 2-3 concrete lower-case nouns or actions as
  keywords for stock footage search.
"#
    )
}

/// Parse an oracle's raw text (possibly fenced) into a script.
fn parse_script_text(text: &str) -> WorkerResult<Script> {
    let text = text.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);

    let parsed: ScriptResponse = serde_json::from_str(text.trim())
        .map_err(|e| WorkerError::parse_error(format!("Script JSON invalid: {}", e)))?;

    Ok(Script {
        scenes: parsed
            .scenes
            .into_iter()
            .map(|s| Scene {
                kind: s.kind,
                text: s.text,
                keywords: s.keywords.into_iter().map(|k| k.to_lowercase()).collect(),
            })
            .collect(),
    })
}

// ============================================================================
// Gemini (primary fast oracle)
// ============================================================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: String,
}

/// Gemini client with key rotation and call pacing.
pub struct GeminiOracle {
    keys: Vec<String>,
    key_index: Mutex<usize>,
    /// Process-wide pacing: at least `min_interval` between calls.
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
    model: String,
    client: reqwest::Client,
    retry: RetryConfig,
}

impl GeminiOracle {
    pub fn new(keys: Vec<String>, min_interval: Duration) -> Self {
        Self {
            keys,
            key_index: Mutex::new(0),
            last_call: Mutex::new(None),
            min_interval,
            model: "gemini-2.5-flash".to_string(),
            client: reqwest::Client::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Build from `GEMINI_API_KEY` and `GEMINI_API_KEY_2..5`, honoring
    /// `GEMINI_ENABLED`. Returns `None` when no keys are configured.
    pub fn from_env(min_interval: Duration) -> Option<Self> {
        let enabled = std::env::var("GEMINI_ENABLED")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);
        if !enabled {
            return None;
        }

        let mut keys = Vec::new();
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                keys.push(key);
            }
        }
        for n in 2..=5 {
            if let Ok(key) = std::env::var(format!("GEMINI_API_KEY_{}", n)) {
                if !key.is_empty() {
                    keys.push(key);
                }
            }
        }

        if keys.is_empty() {
            None
        } else {
            Some(Self::new(keys, min_interval))
        }
    }

    /// Sleep until `min_interval` has passed since the previous call.
    async fn throttle(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Advance to the next key, wrapping. Returns the new index.
    async fn rotate_key(&self) -> usize {
        let mut index = self.key_index.lock().await;
        *index = (*index + 1) % self.keys.len();
        *index
    }

    async fn current_key(&self) -> String {
        let index = *self.key_index.lock().await;
        self.keys[index].clone()
    }

    async fn call_once(&self, prompt: &str) -> Result<String, CallFailure> {
        self.throttle().await;
        let key = self.current_key().await;
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, key
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CallFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallFailure::Http { status, body });
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| CallFailure::Network(format!("Response body unreadable: {}", e)))?;

        parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| CallFailure::Network("No content in Gemini response".to_string()))
    }
}

/// One failed oracle call, before retry policy is applied.
enum CallFailure {
    Http { status: StatusCode, body: String },
    Network(String),
}

#[async_trait]
impl ScriptOracle for GeminiOracle {
    async fn generate_script(
        &self,
        topic: &str,
        duration_seconds: u32,
        tone: Tone,
    ) -> WorkerResult<Script> {
        let prompt = build_prompt(topic, duration_seconds, tone);
        let mut attempt: u32 = 0;
        let mut rotations_in_cycle: usize = 0;

        loop {
            match self.call_once(&prompt).await {
                Ok(text) => return parse_script_text(&text),
                Err(CallFailure::Http { status, body }) if status == StatusCode::TOO_MANY_REQUESTS => {
                    let new_index = self.rotate_key().await;
                    rotations_in_cycle += 1;
                    warn!(key_index = new_index, "Gemini rate limited, rotating key");
                    // A full cycle of exhausted keys counts as one
                    // retriable failure; fresh keys retry immediately.
                    if rotations_in_cycle % self.keys.len() != 0 {
                        continue;
                    }
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        return Err(WorkerError::oracle_fatal(format!(
                            "Gemini rate limited across all keys: {}",
                            body
                        )));
                    }
                    tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
                }
                Err(CallFailure::Http { status, body }) if status.is_client_error() => {
                    return Err(WorkerError::oracle_fatal(format!(
                        "Gemini returned {}: {}",
                        status, body
                    )));
                }
                Err(failure) => {
                    let message = match failure {
                        CallFailure::Http { status, body } => {
                            format!("Gemini returned {}: {}", status, body)
                        }
                        CallFailure::Network(message) => message,
                    };
                    attempt += 1;
                    if attempt > self.retry.max_retries {
                        return Err(WorkerError::oracle_fatal(message));
                    }
                    let delay = self.retry.delay_for_attempt(attempt);
                    warn!(attempt, "Gemini call failed, retrying in {:?}: {}", delay, message);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

// ============================================================================
// Groq (secondary oracle)
// ============================================================================

#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<GroqMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct GroqMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct GroqChoiceMessage {
    content: String,
}

/// Groq chat-completions client used when Gemini is unavailable.
pub struct GroqOracle {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqOracle {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "llama-3.3-70b-versatile".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl ScriptOracle for GroqOracle {
    async fn generate_script(
        &self,
        topic: &str,
        duration_seconds: u32,
        tone: Tone,
    ) -> WorkerResult<Script> {
        let request = GroqRequest {
            model: self.model.clone(),
            messages: vec![GroqMessage {
                role: "user".to_string(),
                content: build_prompt(topic, duration_seconds, tone),
            }],
            temperature: 0.8,
        };

        let response = self
            .client
            .post("https://api.groq.com/openai/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::oracle_fatal(format!("Groq request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::oracle_fatal(format!(
                "Groq returned {}: {}",
                status, body
            )));
        }

        let parsed: GroqResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::oracle_fatal(format!("Groq response unreadable: {}", e)))?;

        let text = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| WorkerError::oracle_fatal("No choices in Groq response"))?;

        parse_script_text(text)
    }
}

// ============================================================================
// Router + canned fallback
// ============================================================================

/// Tries the primary oracle, then the secondary, then (if permitted)
/// the deterministic canned script.
pub struct OracleRouter {
    primary: Option<Box<dyn ScriptOracle>>,
    secondary: Option<Box<dyn ScriptOracle>>,
    fallback: FallbackPolicy,
}

impl OracleRouter {
    pub fn new(
        primary: Option<Box<dyn ScriptOracle>>,
        secondary: Option<Box<dyn ScriptOracle>>,
        fallback: FallbackPolicy,
    ) -> Self {
        Self {
            primary,
            secondary,
            fallback,
        }
    }

    /// Compose from the environment: Gemini primary, Groq secondary,
    /// canned fallback allowed.
    pub fn from_env(min_interval: Duration) -> Self {
        let primary = GeminiOracle::from_env(min_interval)
            .map(|o| Box::new(o) as Box<dyn ScriptOracle>);
        let secondary = GroqOracle::from_env().map(|o| Box::new(o) as Box<dyn ScriptOracle>);
        Self::new(primary, secondary, FallbackPolicy::Allowed)
    }
}

#[async_trait]
impl ScriptOracle for OracleRouter {
    async fn generate_script(
        &self,
        topic: &str,
        duration_seconds: u32,
        tone: Tone,
    ) -> WorkerResult<Script> {
        let mut last_error: Option<WorkerError> = None;

        for oracle in [self.primary.as_ref(), self.secondary.as_ref()]
            .into_iter()
            .flatten()
        {
            match oracle.generate_script(topic, duration_seconds, tone).await {
                Ok(script) => return Ok(script),
                Err(e) => {
                    warn!("Oracle failed, trying next: {}", e);
                    last_error = Some(e);
                }
            }
        }

        if self.fallback == FallbackPolicy::Allowed {
            info!(topic, "All oracles failed, using canned script");
            return Ok(fallback_script(topic));
        }

        Err(last_error
            .unwrap_or_else(|| WorkerError::oracle_fatal("No oracle configured")))
    }
}

/// Deterministic seven-scene skeleton built from the topic alone.
///
/// Constructed to satisfy the script gate (hook uses the "nobody
/// tells you" pattern) and the final auditor (stance words present,
/// ending left unfinished).
pub fn fallback_script(topic: &str) -> Script {
    // Keep the hook within its 12-word budget whatever the topic is.
    let short_topic: String = topic
        .split_whitespace()
        .take(6)
        .collect::<Vec<_>>()
        .join(" ");

    let mut keywords: Vec<String> = topic
        .split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(|c| c.to_lowercase())
                .collect::<String>()
        })
        .filter(|w| w.len() > 2)
        .take(2)
        .collect();
    if keywords.is_empty() {
        keywords.push("story".to_string());
    }
    keywords.push("closeup".to_string());

    let texts = [
        format!("Nobody tells you this about {}", short_topic),
        format!("Everyone repeats the same advice about {}", short_topic),
        "The popular version isn't the problem. The missing half is.".to_string(),
        "Start with the part people skip and the picture changes".to_string(),
        "The failed attempts hide the one detail that matters".to_string(),
        "Once you see it you stop trusting the shortcut".to_string(),
        "Now watch what everyone missed".to_string(),
    ];

    Script {
        scenes: SceneKind::ORDERED
            .iter()
            .zip(texts)
            .map(|(kind, text)| Scene {
                kind: *kind,
                text,
                keywords: keywords.clone(),
            })
            .collect(),
    }
}

// ============================================================================
// Mock
// ============================================================================

/// Test oracle returning a fixed script.
pub struct MockOracle {
    script: Script,
    calls: std::sync::atomic::AtomicU32,
}

impl MockOracle {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: std::sync::atomic::AtomicU32::new(0),
        }
    }

    /// A mock seeded with the canned fallback for the topic.
    pub fn canned(topic: &str) -> Self {
        Self::new(fallback_script(topic))
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl ScriptOracle for MockOracle {
    async fn generate_script(
        &self,
        _topic: &str,
        _duration_seconds: u32,
        _tone: Tone,
    ) -> WorkerResult<Script> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.script.clone())
    }
}
