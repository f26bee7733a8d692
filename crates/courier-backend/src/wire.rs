//! Shared request plumbing for the OpenAI-compatible wire format.

use base64::Engine;
use courier_core::types::Turn;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::BackendError;

/// Build an HTTP client with the configured request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, BackendError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| BackendError::Unreachable(e.to_string()))
}

/// Convert the conversation log into wire-format messages, in order.
pub(crate) fn chat_messages(context: &[Turn]) -> Vec<Value> {
    context
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role.to_string(),
                "content": turn.content,
            })
        })
        .collect()
}

/// POST a JSON body with bearer auth and parse the JSON response.
///
/// Non-success statuses are classified (429 becomes `QuotaExceeded`);
/// transport failures and timeouts come from the `reqwest::Error`
/// conversion.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    api_key: &str,
    body: &Value,
) -> Result<Value, BackendError> {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(BackendError::from_status(status.as_u16(), body));
    }

    let value = response
        .json::<Value>()
        .await
        .map_err(|e| BackendError::Malformed(e.to_string()))?;
    Ok(value)
}

/// Extract `choices[0].message.content` from a chat-completion response.
pub(crate) fn completion_content(response: &Value) -> Result<String, BackendError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| BackendError::Malformed("no message content in response".to_string()))
}

/// Encode image bytes as a base64 data URL for multimodal content parts.
pub(crate) fn image_data_url(image: &[u8]) -> String {
    format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(image)
    )
}
