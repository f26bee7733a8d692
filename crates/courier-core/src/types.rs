use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Identity
// =============================================================================

/// Opaque stable user identifier supplied by the chat transport.
///
/// Never reused across users and immutable once assigned. Keys the
/// preference store and the per-user dispatch queues.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Conversation turns
// =============================================================================

/// Who produced a turn in a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation's ordered history.
///
/// Immutable once appended. Insertion order is semantically required: the
/// log is replayed verbatim as conversational context to the text backends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Backends and capabilities
// =============================================================================

/// The hosted backends the router can address.
///
/// `TextA`, `TextB`, and `Vision` are selectable conversation backends;
/// `Image` is the dedicated image-generation backend addressed directly by
/// the image-prompt path and never held in user preferences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    TextA,
    TextB,
    Vision,
    Image,
}

impl BackendKind {
    /// Whether this backend can be selected as a conversation backend.
    pub fn is_conversational(&self) -> bool {
        !matches!(self, BackendKind::Image)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::TextA => write!(f, "text_a"),
            BackendKind::TextB => write!(f, "text_b"),
            BackendKind::Vision => write!(f, "vision"),
            BackendKind::Image => write!(f, "image"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text_a" => Ok(BackendKind::TextA),
            "text_b" => Ok(BackendKind::TextB),
            "vision" => Ok(BackendKind::Vision),
            "image" => Ok(BackendKind::Image),
            _ => Err(format!("Unknown backend kind: {}", s)),
        }
    }
}

/// Operations a backend may advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    GenerateText,
    GenerateImage,
    DescribeImage,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::GenerateText => write!(f, "generate_text"),
            Capability::GenerateImage => write!(f, "generate_image"),
            Capability::DescribeImage => write!(f, "describe_image"),
        }
    }
}

// =============================================================================
// Response artifacts
// =============================================================================

/// An image produced by the image-generation backend.
///
/// Backends may return either raw bytes or a hosted reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageArtifact {
    Bytes(Vec<u8>),
    Url(String),
}

/// Synthesized speech for one outbound chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifact {
    pub data: Vec<u8>,
    pub mime: String,
}
