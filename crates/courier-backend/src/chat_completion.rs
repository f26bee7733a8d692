//! Text backend over the OpenAI-compatible chat-completion API.

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

/// Adapter for a hosted text model speaking the `/chat/completions` wire
/// format. Both selectable text backends are instances of this adapter with
/// different endpoint configurations.
pub struct ChatCompletionAdapter {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    kind: BackendKind,
}

impl ChatCompletionAdapter {
    /// Create an adapter for one registry slot from its endpoint config and
    /// resolved API key.
    pub fn new(
        kind: BackendKind,
        config: &EndpointConfig,
        api_key: String,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: wire::build_client(config.timeout_secs)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            kind,
        })
    }
}

#[async_trait]
impl BackendAdapter for ChatCompletionAdapter {
    fn name(&self) -> &'static str {
        match self.kind {
            BackendKind::TextA => "text-a",
            BackendKind::TextB => "text-b",
            _ => "chat-completion",
        }
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::GenerateText
    }

    async fn generate_text(&self, context: &[Turn]) -> Result<String, BackendError> {
        let start = Instant::now();
        let body = json!({
            "model": self.model,
            "messages": wire::chat_messages(context),
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = wire::post_json(&self.client, &url, &self.api_key, &body).await?;
        let content = wire::completion_content(&response)?;

        debug!(
            backend = self.name(),
            model = %self.model,
            turns = context.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Text generation complete"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(kind: BackendKind) -> ChatCompletionAdapter {
        ChatCompletionAdapter::new(kind, &EndpointConfig::default(), "test-key".to_string())
            .unwrap()
    }

    #[test]
    fn test_names_follow_registry_slot() {
        assert_eq!(adapter(BackendKind::TextA).name(), "text-a");
        assert_eq!(adapter(BackendKind::TextB).name(), "text-b");
    }

    #[test]
    fn test_capability_set() {
        let a = adapter(BackendKind::TextA);
        assert!(a.supports(Capability::GenerateText));
        assert!(!a.supports(Capability::GenerateImage));
        assert!(!a.supports(Capability::DescribeImage));
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let config = EndpointConfig {
            base_url: "https://api.example.com/v1/".to_string(),
            ..EndpointConfig::default()
        };
        let a = ChatCompletionAdapter::new(BackendKind::TextA, &config, "k".to_string()).unwrap();
        assert_eq!(a.base_url, "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn test_unadvertised_capability_is_unsupported() {
        let a = adapter(BackendKind::TextA);
        let err = a.describe_image(&[0u8; 4]).await.unwrap_err();
        assert!(matches!(err, BackendError::Unsupported { .. }));
    }
}
