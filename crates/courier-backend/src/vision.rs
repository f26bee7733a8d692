//! Vision backend: text generation plus image description.

use async_trait::async_trait;
use courier_core::config::EndpointConfig;
use courier_core::types::{BackendKind, Capability, Turn};
use reqwest::Client;
use serde_json::json;
use std::time::Instant;
use tracing::debug;

use crate::adapter::BackendAdapter;
use crate::error::BackendError;
use crate::wire;

/// Prompt sent alongside an attached image.
const DESCRIBE_PROMPT: &str = "Describe this image in detail.";

/// Adapter for a hosted multimodal model. Advertises both text generation
/// and image description; attached images travel as base64 data URLs inside
/// a multimodal content array.
pub struct VisionAdapter {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl VisionAdapter {
    pub fn new(config: &EndpointConfig, api_key: String) -> Result<Self, BackendError> {
        Ok(Self {
            client: wire::build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl BackendAdapter for VisionAdapter {
    fn name(&self) -> &'static str {
        "vision"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Vision
    }

    fn supports(&self, capability: Capability) -> bool {
        matches!(
            capability,
            Capability::GenerateText | Capability::DescribeImage
        )
    }

    async fn generate_text(&self, context: &[Turn]) -> Result<String, BackendError> {
        let start = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": wire::chat_messages(context),
        });

        let response =
            wire::post_json(&self.client, &self.completions_url(), &self.api_key, &body).await?;
        let content = wire::completion_content(&response)?;

        debug!(
            backend = self.name(),
            turns = context.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Text generation complete"
        );
        Ok(content)
    }

    async fn describe_image(&self, image: &[u8]) -> Result<String, BackendError> {
        let start = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": DESCRIBE_PROMPT},
                    {"type": "image_url", "image_url": {"url": wire::image_data_url(image)}},
                ],
            }],
        });

        let response =
            wire::post_json(&self.client, &self.completions_url(), &self.api_key, &body).await?;
        let content = wire::completion_content(&response)?;

        debug!(
            backend = self.name(),
            image_bytes = image.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Image description complete"
        );
        Ok(content)
    }
}
