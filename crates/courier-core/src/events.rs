//! Inbound and outbound event model at the transport boundary.
//!
//! The transport produces a lazy, infinite sequence of `InboundEvent`s and
//! consumes `OutboundMessage`s. Command recognition lives here so every
//! transport classifies slash commands identically.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{AudioArtifact, ImageArtifact, UserId};

// =============================================================================
// Commands
// =============================================================================

/// Slash commands recognized at the start of a text message.
///
/// Tokens are exact literals and case-sensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Help,
    Clear,
    Settings,
    Model,
    Image,
    Voice,
}

impl Command {
    /// The literal token for this command, including the leading slash.
    pub fn token(&self) -> &'static str {
        match self {
            Command::Start => "/start",
            Command::Help => "/help",
            Command::Clear => "/clear",
            Command::Settings => "/settings",
            Command::Model => "/model",
            Command::Image => "/image",
            Command::Voice => "/voice",
        }
    }

    const ALL: [Command; 7] = [
        Command::Start,
        Command::Help,
        Command::Clear,
        Command::Settings,
        Command::Model,
        Command::Image,
        Command::Voice,
    ];

    /// Match a command token at the start of `text`.
    ///
    /// The token must be followed by end-of-input or whitespace, so
    /// `/starting` is ordinary text. Returns the command and the remainder
    /// after the token, trimmed.
    pub fn parse(text: &str) -> Option<(Command, &str)> {
        for cmd in Command::ALL {
            let token = cmd.token();
            if let Some(rest) = text.strip_prefix(token) {
                if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                    return Some((cmd, rest.trim()));
                }
            }
        }
        None
    }
}

// =============================================================================
// Inbound events
// =============================================================================

/// One event received from the chat transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: UserId,
    pub kind: EventKind,
}

/// Payload of an inbound event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A plain text message (commands and image prompts included).
    Text(String),
    /// An attached image, as raw bytes.
    Image(Vec<u8>),
    /// An inline menu selection referencing a previously shown menu.
    Callback { token: Uuid, data: String },
}

// =============================================================================
// Outbound messages
// =============================================================================

/// One choice in an inline menu shown to a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    /// Human-readable label rendered by the transport.
    pub label: String,
    /// Opaque payload echoed back in the selection callback.
    pub data: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }
}

/// One message sent back through the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutboundMessage {
    Text(String),
    Image(ImageArtifact),
    Voice(AudioArtifact),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_command() {
        let (cmd, rest) = Command::parse("/start").unwrap();
        assert_eq!(cmd, Command::Start);
        assert_eq!(rest, "");
    }

    #[test]
    fn test_parse_command_with_remainder() {
        let (cmd, rest) = Command::parse("/image a red fox").unwrap();
        assert_eq!(cmd, Command::Image);
        assert_eq!(rest, "a red fox");
    }

    #[test]
    fn test_parse_remainder_is_trimmed() {
        let (_, rest) = Command::parse("/image   spaced out  ").unwrap();
        assert_eq!(rest, "spaced out");
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(Command::parse("/Start").is_none());
        assert!(Command::parse("/HELP").is_none());
    }

    #[test]
    fn test_parse_requires_message_start() {
        assert!(Command::parse("please /start").is_none());
        assert!(Command::parse(" /start").is_none());
    }

    #[test]
    fn test_parse_requires_token_boundary() {
        assert!(Command::parse("/starting over").is_none());
        assert!(Command::parse("/clearly").is_none());
    }

    #[test]
    fn test_parse_all_tokens() {
        for cmd in [
            Command::Start,
            Command::Help,
            Command::Clear,
            Command::Settings,
            Command::Model,
            Command::Image,
            Command::Voice,
        ] {
            let (parsed, rest) = Command::parse(cmd.token()).unwrap();
            assert_eq!(parsed, cmd);
            assert_eq!(rest, "");
        }
    }

    #[test]
    fn test_parse_plain_text() {
        assert!(Command::parse("hello there").is_none());
        assert!(Command::parse("").is_none());
    }

    #[test]
    fn test_parse_command_with_newline_boundary() {
        let (cmd, rest) = Command::parse("/help\nsecond line").unwrap();
        assert_eq!(cmd, Command::Help);
        assert_eq!(rest, "second line");
    }

    #[test]
    fn test_menu_option_new() {
        let opt = MenuOption::new("Text model A", "model_text_a");
        assert_eq!(opt.label, "Text model A");
        assert_eq!(opt.data, "model_text_a");
    }
}
