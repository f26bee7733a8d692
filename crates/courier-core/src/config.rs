use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CourierError, Result};

/// Top-level configuration for the Courier application.
///
/// Loaded from `~/.courier/config.toml` by default. Each section corresponds
/// to one subsystem. API keys are never stored in the file; each backend
/// section names the environment variable holding its key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourierConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl CourierConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CourierConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CourierError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Message routing and rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum characters per outbound text chunk.
    pub chunk_size: usize,
    /// Maximum turns kept as conversational context. `None` keeps everything.
    pub max_history_turns: Option<usize>,
    /// Maximum pending inline menus held at once; oldest are evicted.
    pub pending_menu_cap: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            max_history_turns: None,
            pending_menu_cap: 64,
        }
    }
}

/// One hosted backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Backend endpoint configuration, one section per routable backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub text_a: EndpointConfig,
    pub text_b: EndpointConfig,
    pub vision: EndpointConfig,
    pub image: EndpointConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            text_a: EndpointConfig::default(),
            text_b: EndpointConfig {
                base_url: "https://api.deepseek.com/v1".to_string(),
                model: "deepseek-chat".to_string(),
                api_key_env: "DEEPSEEK_API_KEY".to_string(),
                timeout_secs: 60,
            },
            vision: EndpointConfig {
                model: "gpt-4o".to_string(),
                ..EndpointConfig::default()
            },
            image: EndpointConfig {
                model: "dall-e-3".to_string(),
                timeout_secs: 120,
                ..EndpointConfig::default()
            },
        }
    }
}

/// Speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// TTS endpoint URL. `None` disables synthesis entirely.
    pub endpoint: Option<String>,
    /// Model identifier for the TTS service.
    pub model: String,
    /// Voice preset name.
    pub voice: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CourierConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.chunk_size, 4000);
        assert_eq!(config.chat.max_history_turns, None);
        assert_eq!(config.chat.pending_menu_cap, 64);
        assert!(config.voice.endpoint.is_none());
    }

    #[test]
    fn test_default_backend_sections_differ() {
        let backends = BackendsConfig::default();
        assert_eq!(backends.text_a.model, "gpt-4o-mini");
        assert_eq!(backends.text_b.model, "deepseek-chat");
        assert_eq!(backends.text_b.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(backends.vision.model, "gpt-4o");
        assert_eq!(backends.image.model, "dall-e-3");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = CourierConfig::default();
        config.chat.chunk_size = 2000;
        config.chat.max_history_turns = Some(40);
        config.voice.endpoint = Some("https://tts.example.com/v1/speech".to_string());
        config.save(&path).unwrap();

        let loaded = CourierConfig::load(&path).unwrap();
        assert_eq!(loaded.chat.chunk_size, 2000);
        assert_eq!(loaded.chat.max_history_turns, Some(40));
        assert_eq!(
            loaded.voice.endpoint.as_deref(),
            Some("https://tts.example.com/v1/speech")
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(CourierConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = CourierConfig::load_or_default(&path);
        assert_eq!(config.chat.chunk_size, 4000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[chat]\nchunk_size = 512\n").unwrap();

        let config = CourierConfig::load(&path).unwrap();
        assert_eq!(config.chat.chunk_size, 512);
        // Untouched sections keep their defaults.
        assert_eq!(config.chat.pending_menu_cap, 64);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.backends.text_a.model, "gpt-4o-mini");
    }

    #[test]
    fn test_invalid_toml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "chunk_size = [[[").unwrap();
        assert!(CourierConfig::load(&path).is_err());
    }
}
