//! HTTP text-to-speech client.
//!
//! Posts reply chunks to a hosted speech endpoint and returns the audio
//! bytes. Failures degrade to text-only delivery upstream, so every error
//! maps to a `SynthesisError` rather than aborting anything.

use async_trait::async_trait;
use courier_chat::{SpeechSynthesizer, SynthesisError};
use courier_core::config::VoiceConfig;
use courier_core::types::AudioArtifact;
use serde_json::json;
use tracing::debug;

pub struct HttpSpeechSynthesizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    voice: String,
    api_key: Option<String>,
}

impl HttpSpeechSynthesizer {
    /// Build a synthesizer from the voice config section.
    ///
    /// Returns `None` when no endpoint is configured; the caller falls back
    /// to a disabled synthesizer.
    pub fn from_config(config: &VoiceConfig) -> Option<Self> {
        let endpoint = config.endpoint.clone()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .ok()?;
        Some(Self {
            client,
            endpoint,
            model: config.model.clone(),
            voice: config.voice.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SynthesisError> {
        let body = json!({
            "model": self.model,
            "voice": self.voice,
            "input": text,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SynthesisError::Http(status.as_u16()));
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("audio/mpeg")
            .to_string();
        let data = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?
            .to_vec();

        debug!(bytes = data.len(), mime = %mime, "Speech synthesized");
        Ok(AudioArtifact { data, mime })
    }
}
