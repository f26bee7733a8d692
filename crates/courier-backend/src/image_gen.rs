//! Image-generation backend over the `/images/generations` API.

use async_trait::async_trait;
use base64::Engine;
use courier_core::config::EndpointConfig;
use courier_core::types::{BackendKind, Capability, ImageArtifact};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::debug;

use crate::adapter::BackendAdapter;
use crate::error::BackendError;
use crate::wire;

/// Adapter for a hosted image-generation model. One-shot: prompts are not
/// conversational context and nothing is remembered between calls.
pub struct ImageGenAdapter {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ImageGenAdapter {
    pub fn new(config: &EndpointConfig, api_key: String) -> Result<Self, BackendError> {
        Ok(Self {
            client: wire::build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Pull the first generated image out of a response, preferring inline
    /// base64 bytes over a hosted URL.
    fn extract_artifact(response: &Value) -> Result<ImageArtifact, BackendError> {
        let first = &response["data"][0];
        if let Some(b64) = first["b64_json"].as_str() {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|e| BackendError::Malformed(format!("invalid image base64: {}", e)))?;
            return Ok(ImageArtifact::Bytes(bytes));
        }
        if let Some(url) = first["url"].as_str() {
            return Ok(ImageArtifact::Url(url.to_string()));
        }
        Err(BackendError::Malformed(
            "no image data in response".to_string(),
        ))
    }
}

#[async_trait]
impl BackendAdapter for ImageGenAdapter {
    fn name(&self) -> &'static str {
        "image-gen"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Image
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::GenerateImage
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageArtifact, BackendError> {
        let start = Instant::now();
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
        });

        let url = format!("{}/images/generations", self.base_url);
        let response = wire::post_json(&self.client, &url, &self.api_key, &body).await?;
        let artifact = Self::extract_artifact(&response)?;

        debug!(
            backend = self.name(),
            model = %self.model,
            prompt_len = prompt.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Image generation complete"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ImageGenAdapter {
        ImageGenAdapter::new(&EndpointConfig::default(), "test-key".to_string()).unwrap()
    }

    #[test]
    fn test_capability_set() {
        let a = adapter();
        assert!(a.supports(Capability::GenerateImage));
        assert!(!a.supports(Capability::GenerateText));
        assert!(!a.supports(Capability::DescribeImage));
    }

    #[test]
    fn test_extract_artifact_b64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        let response = json!({"data": [{"b64_json": encoded}]});
        let artifact = ImageGenAdapter::extract_artifact(&response).unwrap();
        assert_eq!(artifact, ImageArtifact::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn test_extract_artifact_url() {
        let response = json!({"data": [{"url": "https://cdn.example.com/fox.png"}]});
        let artifact = ImageGenAdapter::extract_artifact(&response).unwrap();
        assert_eq!(
            artifact,
            ImageArtifact::Url("https://cdn.example.com/fox.png".to_string())
        );
    }

    #[test]
    fn test_extract_artifact_prefers_bytes() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([9u8]);
        let response = json!({"data": [{"b64_json": encoded, "url": "https://x.example"}]});
        let artifact = ImageGenAdapter::extract_artifact(&response).unwrap();
        assert!(matches!(artifact, ImageArtifact::Bytes(_)));
    }

    #[test]
    fn test_extract_artifact_empty_response() {
        let response = json!({"data": []});
        let err = ImageGenAdapter::extract_artifact(&response).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[test]
    fn test_extract_artifact_bad_base64() {
        let response = json!({"data": [{"b64_json": "not base64!!!"}]});
        let err = ImageGenAdapter::extract_artifact(&response).unwrap_err();
        assert!(matches!(err, BackendError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_generate_text_is_unsupported() {
        let a = adapter();
        let err = a.generate_text(&[]).await.unwrap_err();
        assert!(matches!(err, BackendError::Unsupported { .. }));
    }
}
