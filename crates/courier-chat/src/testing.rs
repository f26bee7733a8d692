//! In-memory collaborator implementations for tests.
//!
//! Deterministic stand-ins for the transport, the backends, and the
//! synthesizer so routing behavior can be exercised without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::events::{InboundEvent, MenuOption, OutboundMessage};
use courier_core::types::{AudioArtifact, BackendKind, Capability, ImageArtifact, Turn, UserId};
use courier_backend::{BackendAdapter, BackendError};
use uuid::Uuid;

use crate::synth::{SpeechSynthesizer, SynthesisError};
use crate::transport::{ChatTransport, TransportError};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MockTransport
// =============================================================================

/// A menu shown through the mock transport.
#[derive(Clone, Debug)]
pub struct ShownMenu {
    pub user: UserId,
    pub token: Uuid,
    pub title: String,
    pub options: Vec<MenuOption>,
}

/// Records everything sent through it; feeds back queued inbound events.
#[derive(Default)]
pub struct MockTransport {
    events: Mutex<VecDeque<InboundEvent>>,
    sent: Mutex<Vec<(UserId, OutboundMessage)>>,
    menus: Mutex<Vec<ShownMenu>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_event(&self, event: InboundEvent) {
        lock(&self.events).push_back(event);
    }

    /// All messages sent so far, in order.
    pub fn sent(&self) -> Vec<(UserId, OutboundMessage)> {
        lock(&self.sent).clone()
    }

    /// Text payloads sent to one user, in order.
    pub fn texts_for(&self, user: UserId) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter(|(u, _)| *u == user)
            .filter_map(|(_, m)| match m {
                OutboundMessage::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn menus_shown(&self) -> Vec<ShownMenu> {
        lock(&self.menus).clone()
    }

    /// Token of the most recently shown menu.
    pub fn last_menu_token(&self) -> Option<Uuid> {
        lock(&self.menus).last().map(|m| m.token)
    }
}

#[async_trait]
impl ChatTransport for MockTransport {
    async fn next_event(&self) -> Option<InboundEvent> {
        lock(&self.events).pop_front()
    }

    async fn send(&self, user: UserId, message: OutboundMessage) -> Result<(), TransportError> {
        lock(&self.sent).push((user, message));
        Ok(())
    }

    async fn show_menu(
        &self,
        user: UserId,
        title: &str,
        options: &[MenuOption],
    ) -> Result<Uuid, TransportError> {
        let token = Uuid::new_v4();
        lock(&self.menus).push(ShownMenu {
            user,
            token,
            title: title.to_string(),
            options: options.to_vec(),
        });
        Ok(token)
    }
}

// =============================================================================
// ScriptedBackend
// =============================================================================

/// Backend whose replies are scripted up front.
///
/// Records every context it receives so tests can assert exactly what
/// history was forwarded. An optional per-call delay makes ordering races
/// observable in gate tests.
pub struct ScriptedBackend {
    kind: BackendKind,
    capabilities: Vec<Capability>,
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    contexts: Mutex<Vec<Vec<Turn>>>,
    described: Mutex<Vec<usize>>,
    delay: Option<Duration>,
}

impl ScriptedBackend {
    pub fn text(kind: BackendKind) -> Self {
        Self {
            kind,
            capabilities: vec![Capability::GenerateText],
            replies: Mutex::new(VecDeque::new()),
            contexts: Mutex::new(Vec::new()),
            described: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn vision() -> Self {
        Self {
            capabilities: vec![Capability::GenerateText, Capability::DescribeImage],
            ..Self::text(BackendKind::Vision)
        }
    }

    pub fn with_replies(mut self, replies: Vec<Result<String, BackendError>>) -> Self {
        self.replies = Mutex::new(replies.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Contexts passed to `generate_text`, in call order.
    pub fn contexts(&self) -> Vec<Vec<Turn>> {
        lock(&self.contexts).clone()
    }

    /// Byte lengths of images passed to `describe_image`.
    pub fn described(&self) -> Vec<usize> {
        lock(&self.described).clone()
    }

    fn next_reply(&self) -> Result<String, BackendError> {
        lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| Ok("scripted reply".to_string()))
    }
}

#[async_trait]
impl BackendAdapter for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    async fn generate_text(&self, context: &[Turn]) -> Result<String, BackendError> {
        lock(&self.contexts).push(context.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply()
    }

    async fn describe_image(&self, image: &[u8]) -> Result<String, BackendError> {
        lock(&self.described).push(image.len());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_reply()
    }
}

// =============================================================================
// ScriptedImageBackend
// =============================================================================

/// Image-generation backend returning a fixed artifact.
pub struct ScriptedImageBackend {
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedImageBackend {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }
}

impl Default for ScriptedImageBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendAdapter for ScriptedImageBackend {
    fn name(&self) -> &'static str {
        "scripted-image"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Image
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::GenerateImage
    }

    async fn generate_image(&self, prompt: &str) -> Result<ImageArtifact, BackendError> {
        lock(&self.prompts).push(prompt.to_string());
        if self.fail {
            Err(BackendError::QuotaExceeded)
        } else {
            Ok(ImageArtifact::Url(format!(
                "https://images.test/{}",
                prompt.len()
            )))
        }
    }
}

// =============================================================================
// MockSynthesizer
// =============================================================================

/// Synthesizer that succeeds, or fails on one specific call (1-based).
pub struct MockSynthesizer {
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

impl MockSynthesizer {
    pub fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(call),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioArtifact, SynthesisError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(SynthesisError::Request("scripted failure".to_string()));
        }
        Ok(AudioArtifact {
            data: text.as_bytes().to_vec(),
            mime: "audio/ogg".to_string(),
        })
    }
}
