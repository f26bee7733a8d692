//! Response rendering: chunking and best-effort voice.

use courier_core::types::AudioArtifact;
use tracing::warn;

use crate::synth::SpeechSynthesizer;

/// One transport-sized slice of an outbound reply.
#[derive(Clone, Debug)]
pub struct RenderedChunk {
    pub text: String,
    /// Present when voice is enabled and synthesis succeeded for this chunk.
    pub voice: Option<AudioArtifact>,
}

/// Splits long replies into transport-sized chunks and optionally attaches
/// a voice artifact per chunk.
pub struct ResponseRenderer {
    chunk_size: usize,
}

impl ResponseRenderer {
    /// Create a renderer with the configured chunk size in characters.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Contiguous character slices of at most `chunk_size` characters.
    ///
    /// Slicing counts characters, never bytes, so multi-byte text cannot be
    /// split inside a code point; concatenating the chunks reproduces the
    /// input exactly.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut count = 0;
        for ch in text.chars() {
            current.push(ch);
            count += 1;
            if count == self.chunk_size {
                chunks.push(std::mem::take(&mut current));
                count = 0;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Render a reply into outbound chunks, attaching voice per chunk when
    /// enabled. A synthesis failure leaves that chunk text-only and does not
    /// affect the others.
    pub async fn render(
        &self,
        text: &str,
        voice_enabled: bool,
        synthesizer: &dyn SpeechSynthesizer,
    ) -> Vec<RenderedChunk> {
        let mut rendered = Vec::new();
        for chunk in self.chunk(text) {
            let voice = if voice_enabled {
                match synthesizer.synthesize(&chunk).await {
                    Ok(audio) => Some(audio),
                    Err(e) => {
                        warn!(error = %e, chunk_len = chunk.len(), "Voice synthesis failed; delivering text only");
                        None
                    }
                }
            } else {
                None
            };
            rendered.push(RenderedChunk { text: chunk, voice });
        }
        rendered
    }
}
