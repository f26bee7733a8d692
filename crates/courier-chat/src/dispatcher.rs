//! Message dispatcher: the per-event routing state machine.
//!
//! For each inbound event the dispatcher resolves the user's state,
//! classifies the event, selects a backend adapter, invokes it with the
//! accumulated context, updates the conversation log, and packages the
//! multi-modal response back through the transport. The dispatcher itself
//! is stateless across events; everything durable lives in the
//! `PreferenceStore`.

use std::sync::Arc;

use courier_backend::{BackendError, BackendRegistry};
use courier_core::config::ChatConfig;
use courier_core::events::{Command, EventKind, InboundEvent, OutboundMessage};
use courier_core::types::{BackendKind, Capability, Turn, UserId};
use courier_store::PreferenceStore;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ChatError;
use crate::menu::{MenuKind, MenuOutcome, MenuStateMachine};
use crate::render::ResponseRenderer;
use crate::synth::SpeechSynthesizer;
use crate::transport::ChatTransport;

/// Literal prefix routing a text message to the image-generation backend.
/// Matched case-insensitively; the remainder after the colon is the prompt.
pub const IMAGE_PROMPT_PREFIX: &str = "generate image:";

/// What gets logged as the user turn when an attached image is analyzed.
/// Raw bytes never enter the conversation log.
const IMAGE_ANALYZED_MARKER: &str = "[sent an image for analysis]";

const FAILURE_NOTICE: &str = "Something went wrong talking to the model. Please try again.";
const IMAGE_CAPABILITY_NOTICE: &str =
    "The current model can't analyze images. Pick the vision model with /model first.";
const IMAGE_GEN_UNAVAILABLE_NOTICE: &str = "Image generation isn't available right now.";
const IMAGE_USAGE_NOTICE: &str =
    "Usage: /image <prompt>, or start a message with \"generate image:\".";

const WELCOME_TEXT: &str = "Hi! I'm Courier. Send me a message and I'll route it to the \
selected model. Try /help for the full command list.";
const HELP_TEXT: &str = "Commands:\n\
/start - introduction\n\
/help - this message\n\
/clear - forget the current conversation\n\
/model - choose the conversation model\n\
/settings - same as /model\n\
/voice - toggle spoken replies\n\
/image <prompt> - generate an image\n\
You can also start any message with \"generate image:\".";

/// Routes inbound events to backends and packages the responses.
pub struct Dispatcher {
    store: Arc<PreferenceStore>,
    registry: Arc<BackendRegistry>,
    menus: MenuStateMachine,
    renderer: ResponseRenderer,
    transport: Arc<dyn ChatTransport>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<PreferenceStore>,
        registry: Arc<BackendRegistry>,
        transport: Arc<dyn ChatTransport>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        config: &ChatConfig,
    ) -> Self {
        Self {
            store,
            registry,
            menus: MenuStateMachine::new(config.pending_menu_cap),
            renderer: ResponseRenderer::new(config.chunk_size),
            transport,
            synthesizer,
        }
    }

    /// Handle one inbound event end to end.
    ///
    /// Backend and synthesis failures become user-visible notices inside;
    /// only transport failures escape, and the caller just logs those.
    /// Nothing here may terminate the event loop.
    pub async fn handle_event(&self, event: InboundEvent) {
        let user = event.user;
        let result = match event.kind {
            EventKind::Text(text) => self.handle_text(user, &text).await,
            EventKind::Image(bytes) => self.handle_image(user, &bytes).await,
            EventKind::Callback { token, data } => self.handle_callback(user, token, &data).await,
        };
        if let Err(e) = result {
            warn!(user = %user, error = %e, "Event handling failed");
        }
    }

    // -- Classification --

    async fn handle_text(&self, user: UserId, text: &str) -> Result<(), ChatError> {
        // First contact creates the default record even for commands.
        let _ = self.store.get_or_create(user);

        if let Some((command, rest)) = Command::parse(text) {
            return self.handle_command(user, command, rest).await;
        }
        if let Some(prompt) = strip_image_prefix(text) {
            return self.generate_image(user, prompt).await;
        }
        self.chat_turn(user, text).await
    }

    // -- Commands --

    async fn handle_command(
        &self,
        user: UserId,
        command: Command,
        rest: &str,
    ) -> Result<(), ChatError> {
        debug!(user = %user, command = ?command, "Command received");
        match command {
            Command::Start => self.send_text(user, WELCOME_TEXT).await,
            Command::Help => self.send_text(user, HELP_TEXT).await,
            Command::Clear => {
                self.store.clear(user);
                self.send_text(user, "Conversation history cleared.").await
            }
            Command::Model | Command::Settings => {
                let token = self
                    .transport
                    .show_menu(user, "Choose a model", &MenuStateMachine::model_options())
                    .await?;
                self.menus.record(user, token, MenuKind::ModelSelect);
                Ok(())
            }
            Command::Voice => {
                let options = MenuStateMachine::voice_options(self.store.voice_enabled(user));
                let token = self
                    .transport
                    .show_menu(user, "Voice replies", &options)
                    .await?;
                self.menus.record(user, token, MenuKind::VoiceToggle);
                Ok(())
            }
            Command::Image => {
                if rest.is_empty() {
                    self.send_text(user, IMAGE_USAGE_NOTICE).await
                } else {
                    self.generate_image(user, rest).await
                }
            }
        }
    }

    // -- Callbacks --

    async fn handle_callback(
        &self,
        user: UserId,
        token: Uuid,
        data: &str,
    ) -> Result<(), ChatError> {
        match self.menus.apply(user, token, data, &self.store) {
            Some(MenuOutcome::BackendSelected(backend)) => {
                self.send_text(user, &format!("Model switched to {}.", backend))
                    .await
            }
            Some(MenuOutcome::VoiceToggled(enabled)) => {
                let notice = if enabled {
                    "Voice replies are now on."
                } else {
                    "Voice replies are now off."
                };
                self.send_text(user, notice).await
            }
            // Unknown token or data: ignored with no state change so
            // duplicate callbacks stay harmless.
            None => Ok(()),
        }
    }

    // -- Attached images --

    async fn handle_image(&self, user: UserId, image: &[u8]) -> Result<(), ChatError> {
        let _ = self.store.get_or_create(user);
        let selected = self.store.backend(user);

        let adapter = match self.registry.get(selected) {
            Some(a) if a.supports(Capability::DescribeImage) => a,
            _ => {
                debug!(user = %user, backend = %selected, "Selected backend lacks describe_image");
                return self.send_text(user, IMAGE_CAPABILITY_NOTICE).await;
            }
        };

        match adapter.describe_image(image).await {
            Ok(description) => {
                self.store.append_turn(user, Turn::user(IMAGE_ANALYZED_MARKER));
                self.store.append_turn(user, Turn::assistant(&description));
                self.respond(user, &description).await
            }
            Err(e) => {
                warn!(user = %user, backend = adapter.name(), error = %e, "Image description failed");
                self.send_text(user, FAILURE_NOTICE).await
            }
        }
    }

    // -- Image generation --

    /// One-shot image generation. Deliberately never touches the
    /// conversation log: image prompts are not conversational context, which
    /// keeps the text history backend-agnostic.
    async fn generate_image(&self, user: UserId, prompt: &str) -> Result<(), ChatError> {
        let adapter = match self.registry.get(BackendKind::Image) {
            Some(a) if a.supports(Capability::GenerateImage) => a,
            _ => {
                debug!(user = %user, "No image-generation backend registered");
                return self.send_text(user, IMAGE_GEN_UNAVAILABLE_NOTICE).await;
            }
        };

        match adapter.generate_image(prompt).await {
            Ok(artifact) => {
                // Emitted directly; the text chunker is for text replies only.
                self.transport
                    .send(user, OutboundMessage::Image(artifact))
                    .await?;
                Ok(())
            }
            Err(e) => {
                warn!(user = %user, backend = adapter.name(), error = %e, "Image generation failed");
                self.send_text(user, FAILURE_NOTICE).await
            }
        }
    }

    // -- Conversational text --

    async fn chat_turn(&self, user: UserId, text: &str) -> Result<(), ChatError> {
        let mut context = self.store.history(user);
        context.push(Turn::user(text));
        let selected = self.store.backend(user);

        let adapter = match self.registry.get(selected) {
            Some(a) if a.supports(Capability::GenerateText) => a,
            _ => {
                warn!(user = %user, backend = %selected, "Selected backend cannot generate text");
                return self.send_text(user, FAILURE_NOTICE).await;
            }
        };

        match adapter.generate_text(&context).await {
            Ok(reply) => {
                // Both turns commit together, so the log only ever holds
                // completed exchanges.
                self.store.append_turn(user, Turn::user(text));
                self.store.append_turn(user, Turn::assistant(&reply));
                self.respond(user, &reply).await
            }
            Err(e) => {
                self.log_backend_failure(user, adapter.name(), &e);
                self.send_text(user, FAILURE_NOTICE).await
            }
        }
    }

    // -- Response packaging --

    async fn respond(&self, user: UserId, reply: &str) -> Result<(), ChatError> {
        let voice_enabled = self.store.voice_enabled(user);
        let chunks = self
            .renderer
            .render(reply, voice_enabled, self.synthesizer.as_ref())
            .await;

        for chunk in chunks {
            self.transport
                .send(user, OutboundMessage::Text(chunk.text))
                .await?;
            if let Some(audio) = chunk.voice {
                self.transport
                    .send(user, OutboundMessage::Voice(audio))
                    .await?;
            }
        }
        Ok(())
    }

    async fn send_text(&self, user: UserId, text: &str) -> Result<(), ChatError> {
        self.transport
            .send(user, OutboundMessage::Text(text.to_string()))
            .await?;
        Ok(())
    }

    fn log_backend_failure(&self, user: UserId, backend: &str, error: &BackendError) {
        warn!(user = %user, backend, error = %error, "Text generation failed");
    }
}

/// Match the image-generation prefix case-insensitively at the start of a
/// message; the remainder, trimmed, is the prompt.
fn strip_image_prefix(text: &str) -> Option<&str> {
    let trimmed = text.trim_start();
    match trimmed.split_at_checked(IMAGE_PROMPT_PREFIX.len()) {
        Some((head, rest)) if head.eq_ignore_ascii_case(IMAGE_PROMPT_PREFIX) => Some(rest.trim()),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
