//! Speech synthesis boundary.

use async_trait::async_trait;
use courier_core::types::AudioArtifact;

/// Errors from the voice-synthesis collaborator.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("speech synthesis is not configured")]
    NotConfigured,
    #[error("synthesis request failed: {0}")]
    Request(String),
    #[error("synthesis service returned HTTP {0}")]
    Http(u16),
}

/// Narrow interface to the external text-to-speech service.
///
/// Synthesis is always best-effort: a failure must never block delivery of
/// the chunk's text or of subsequent chunks.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SynthesisError>;
}

/// Synthesizer used when no TTS endpoint is configured. Every call fails
/// with `NotConfigured`, which the renderer downgrades to a text-only chunk.
pub struct DisabledSynthesizer;

#[async_trait]
impl SpeechSynthesizer for DisabledSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<AudioArtifact, SynthesisError> {
        Err(SynthesisError::NotConfigured)
    }
}
