//! Courier application binary - composition root.
//!
//! Ties the Courier crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Build backend adapters from the configured endpoints and env API keys
//! 3. Wire the dispatcher (preference store, menus, renderer, synthesizer)
//! 4. Run the event loop over the console transport

use std::sync::Arc;

use clap::Parser;
use courier_backend::{BackendRegistry, ChatCompletionAdapter, ImageGenAdapter, VisionAdapter};
use courier_chat::{DisabledSynthesizer, Dispatcher, SessionGate, SpeechSynthesizer};
use courier_core::config::{CourierConfig, EndpointConfig};
use courier_core::types::BackendKind;
use courier_store::PreferenceStore;

mod cli;
mod console;
mod speech;

use cli::CliArgs;
use console::ConsoleTransport;
use speech::HttpSpeechSynthesizer;

/// Read an endpoint's API key from its configured environment variable.
/// A missing key disables that backend rather than failing startup.
fn api_key(config: &EndpointConfig) -> Option<String> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.is_empty() => Some(key),
        _ => {
            tracing::warn!(
                env_var = %config.api_key_env,
                model = %config.model,
                "API key not set; backend disabled"
            );
            None
        }
    }
}

fn build_registry(config: &CourierConfig) -> Result<BackendRegistry, Box<dyn std::error::Error>> {
    let mut registry = BackendRegistry::new();

    for (kind, endpoint) in [
        (BackendKind::TextA, &config.backends.text_a),
        (BackendKind::TextB, &config.backends.text_b),
    ] {
        if let Some(key) = api_key(endpoint) {
            registry.register(Arc::new(ChatCompletionAdapter::new(kind, endpoint, key)?));
            tracing::info!(backend = %kind, model = %endpoint.model, "Text backend registered");
        }
    }

    if let Some(key) = api_key(&config.backends.vision) {
        registry.register(Arc::new(VisionAdapter::new(&config.backends.vision, key)?));
        tracing::info!(model = %config.backends.vision.model, "Vision backend registered");
    }

    if let Some(key) = api_key(&config.backends.image) {
        registry.register(Arc::new(ImageGenAdapter::new(&config.backends.image, key)?));
        tracing::info!(model = %config.backends.image.model, "Image backend registered");
    }

    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first so its log level can seed the filter.
    let config_file = args.resolve_config_path();
    let config = CourierConfig::load_or_default(&config_file);

    // Tracing. Priority: --log-level > RUST_LOG > config value.
    let default_filter = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    tracing::info!("Starting Courier v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Backends.
    let registry = build_registry(&config)?;
    if registry.is_empty() {
        tracing::error!("No backends registered; set at least one API key env var");
        return Err("no backends available".into());
    }

    // Voice.
    let synthesizer: Arc<dyn SpeechSynthesizer> =
        match HttpSpeechSynthesizer::from_config(&config.voice) {
            Some(s) => {
                tracing::info!(model = %config.voice.model, "Voice synthesis enabled");
                Arc::new(s)
            }
            None => {
                tracing::info!("No voice endpoint configured; voice replies unavailable");
                Arc::new(DisabledSynthesizer)
            }
        };

    // Dispatcher and event loop.
    let store = Arc::new(PreferenceStore::new(config.chat.max_history_turns));
    let transport = Arc::new(ConsoleTransport::new());
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        Arc::new(registry),
        transport.clone(),
        synthesizer,
        &config.chat,
    ));

    let gate = Arc::new(SessionGate::new(dispatcher));
    gate.run(transport).await;

    Ok(())
}
