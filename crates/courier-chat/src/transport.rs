//! Chat transport boundary.

use async_trait::async_trait;
use courier_core::events::{InboundEvent, MenuOption, OutboundMessage};
use courier_core::types::UserId;
use uuid::Uuid;

/// Errors surfaced by the external transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("transport closed")]
    Closed,
}

/// Narrow interface to the external chat transport.
///
/// The transport owns message delivery and inline-keyboard rendering; the
/// core never sees platform specifics. `next_event` yields a lazy, infinite,
/// non-restartable sequence of events; `None` means the transport has shut
/// down and the event loop should exit.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Receive the next inbound event, suspending until one arrives.
    async fn next_event(&self) -> Option<InboundEvent>;

    /// Deliver one outbound message to a user.
    async fn send(&self, user: UserId, message: OutboundMessage) -> Result<(), TransportError>;

    /// Show an inline menu and return the token later echoed by the
    /// selection callback.
    async fn show_menu(
        &self,
        user: UserId,
        title: &str,
        options: &[MenuOption],
    ) -> Result<Uuid, TransportError>;
}
