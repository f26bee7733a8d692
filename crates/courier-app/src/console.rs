//! Console transport: a single-user chat session over stdin/stdout.
//!
//! Lets the whole routing stack run locally without a messaging platform.
//! One local user, lines in, replies out. Menus print as numbered lists and
//! a bare number on the next line answers the most recent one. A line of
//! the form `@image <path>` attaches the file's bytes as an image event.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use courier_chat::{ChatTransport, TransportError};
use courier_core::events::{EventKind, InboundEvent, MenuOption, OutboundMessage};
use courier_core::types::{ImageArtifact, UserId};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;
use uuid::Uuid;

/// The single local user of a console session.
const LOCAL_USER: UserId = UserId(0);

struct PendingMenu {
    token: Uuid,
    options: Vec<MenuOption>,
}

pub struct ConsoleTransport {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
    menu: Mutex<Option<PendingMenu>>,
}

impl ConsoleTransport {
    pub fn new() -> Self {
        Self {
            lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
            menu: Mutex::new(None),
        }
    }

    /// Interpret a bare number as an answer to the most recent menu.
    fn menu_selection(&self, line: &str) -> Option<(Uuid, String)> {
        let choice: usize = line.trim().parse().ok()?;
        let menu = self.menu.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = menu.as_ref()?;
        let option = pending.options.get(choice.checked_sub(1)?)?;
        Some((pending.token, option.data.clone()))
    }

    async fn attach_image(path: &str) -> Option<EventKind> {
        match tokio::fs::read(Path::new(path.trim())).await {
            Ok(bytes) => Some(EventKind::Image(bytes)),
            Err(e) => {
                println!("could not read image {}: {}", path.trim(), e);
                None
            }
        }
    }
}

impl Default for ConsoleTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn next_event(&self) -> Option<InboundEvent> {
        loop {
            let line = {
                let mut lines = self.lines.lock().await;
                lines.next_line().await.ok()??
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((token, data)) = self.menu_selection(line) {
                return Some(InboundEvent {
                    user: LOCAL_USER,
                    kind: EventKind::Callback { token, data },
                });
            }

            if let Some(path) = line.strip_prefix("@image ") {
                match Self::attach_image(path).await {
                    Some(kind) => {
                        return Some(InboundEvent {
                            user: LOCAL_USER,
                            kind,
                        })
                    }
                    None => continue,
                }
            }

            return Some(InboundEvent {
                user: LOCAL_USER,
                kind: EventKind::Text(line.to_string()),
            });
        }
    }

    async fn send(&self, _user: UserId, message: OutboundMessage) -> Result<(), TransportError> {
        match message {
            OutboundMessage::Text(text) => println!("{}", text),
            OutboundMessage::Image(ImageArtifact::Url(url)) => println!("[image] {}", url),
            OutboundMessage::Image(ImageArtifact::Bytes(bytes)) => {
                println!("[image] {} bytes received", bytes.len())
            }
            OutboundMessage::Voice(audio) => {
                println!("[voice] {} bytes ({})", audio.data.len(), audio.mime)
            }
        }
        Ok(())
    }

    async fn show_menu(
        &self,
        _user: UserId,
        title: &str,
        options: &[MenuOption],
    ) -> Result<Uuid, TransportError> {
        let token = Uuid::new_v4();
        println!("{}", title);
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {}", i + 1, option.label);
        }
        debug!(%token, options = options.len(), "Menu shown on console");
        *self.menu.lock().unwrap_or_else(PoisonError::into_inner) = Some(PendingMenu {
            token,
            options: options.to_vec(),
        });
        Ok(token)
    }
}
