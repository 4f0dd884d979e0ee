//! Speech synthesis adapters.
//!
//! The timing model is authoritative for word timestamps no matter
//! which synthesis path runs; these adapters only produce the audio
//! track the renderer muxes in.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{WorkerError, WorkerResult};

/// Capability interface over an audio synthesizer.
#[async_trait]
pub trait SpeechSynth: Send + Sync {
    /// Synthesize `text` to a file under `audio_dir` and return its
    /// path. `duration_ms` is the timing model's authoritative length.
    async fn synthesize(
        &self,
        text: &str,
        duration_ms: u64,
        audio_dir: &Path,
        file_stem: &str,
    ) -> WorkerResult<PathBuf>;
}

// ============================================================================
// ElevenLabs (premium path)
// ============================================================================

/// ElevenLabs streaming TTS client.
pub struct ElevenLabsSynth {
    api_key: String,
    voice_id: String,
    client: reqwest::Client,
}

impl ElevenLabsSynth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> Option<Self> {
        std::env::var("ELEVENLABS_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self::new)
    }
}

#[async_trait]
impl SpeechSynth for ElevenLabsSynth {
    async fn synthesize(
        &self,
        text: &str,
        _duration_ms: u64,
        audio_dir: &Path,
        file_stem: &str,
    ) -> WorkerResult<PathBuf> {
        tokio::fs::create_dir_all(audio_dir).await?;
        let out_path = audio_dir.join(format!("{}.mp3", file_stem));

        let url = format!(
            "https://api.elevenlabs.io/v1/text-to-speech/{}/stream",
            self.voice_id
        );
        let body = serde_json::json!({
            "text": text,
            "model_id": "eleven_turbo_v2",
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WorkerError::config_error(format!("ElevenLabs request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WorkerError::config_error(format!(
                "ElevenLabs returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::config_error(format!("ElevenLabs stream failed: {}", e)))?;
        let mut file = tokio::fs::File::create(&out_path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        info!(bytes = bytes.len(), "Synthesized speech to {}", out_path.display());
        Ok(out_path)
    }
}

// ============================================================================
// Silent fallback
// ============================================================================

/// Fallback synth writing a silent WAV of the synthesized duration.
#[derive(Debug, Default)]
pub struct SilentSynth;

#[async_trait]
impl SpeechSynth for SilentSynth {
    async fn synthesize(
        &self,
        _text: &str,
        duration_ms: u64,
        audio_dir: &Path,
        file_stem: &str,
    ) -> WorkerResult<PathBuf> {
        let out_path = audio_dir.join(format!("{}.wav", file_stem));
        let path = out_path.clone();
        // hound's writer is synchronous; keep it off the async threads.
        tokio::task::spawn_blocking(move || reel_media::write_silent_wav(&path, duration_ms))
            .await
            .map_err(|e| WorkerError::config_error(format!("WAV writer task failed: {}", e)))??;
        debug!(duration_ms, "Wrote silent narration {}", out_path.display());
        Ok(out_path)
    }
}

/// Pick the best available synth: ElevenLabs when configured, else
/// the silent WAV fallback.
pub fn synth_from_env() -> Box<dyn SpeechSynth> {
    match ElevenLabsSynth::from_env() {
        Some(synth) => {
            info!("Using ElevenLabs speech synthesis");
            Box::new(synth)
        }
        None => {
            info!("No TTS key configured, narration will be silent");
            Box::new(SilentSynth)
        }
    }
}
