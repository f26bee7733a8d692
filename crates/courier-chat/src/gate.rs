//! Per-user event serialization.
//!
//! Events from one user must be handled in arrival order, while events
//! from different users proceed concurrently. The gate gives each user a
//! dedicated worker task fed by an unbounded channel: the channel's FIFO
//! order makes per-user ordering structural rather than a scheduling
//! accident, and distinct users' workers run independently.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use courier_core::events::InboundEvent;
use courier_core::types::UserId;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::transport::ChatTransport;

/// Fans inbound events out to per-user worker tasks.
pub struct SessionGate {
    dispatcher: Arc<Dispatcher>,
    workers: Mutex<HashMap<UserId, mpsc::UnboundedSender<InboundEvent>>>,
}

impl SessionGate {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            workers: Mutex::new(HashMap::new()),
        }
    }

    /// Enqueue one event on its user's worker, spawning the worker on the
    /// user's first event. Events submitted for a user are dispatched in
    /// submission order.
    pub fn submit(&self, event: InboundEvent) {
        let user = event.user;
        let mut workers = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let sender = workers
            .entry(user)
            .or_insert_with(|| self.spawn_worker(user));
        if let Err(err) = sender.send(event) {
            // Worker exited (can only happen on shutdown); restart it and
            // requeue on the fresh channel.
            debug!(user = %user, "Respawning session worker");
            let sender = self.spawn_worker(user);
            let _ = sender.send(err.0);
            workers.insert(user, sender);
        }
    }

    /// Drain the transport until it closes, feeding every event through the
    /// gate. This is the process's main loop.
    pub async fn run(self: Arc<Self>, transport: Arc<dyn ChatTransport>) {
        info!("Event loop started");
        while let Some(event) = transport.next_event().await {
            self.submit(event);
        }
        info!("Transport closed; event loop stopped");
    }

    fn spawn_worker(&self, user: UserId) -> mpsc::UnboundedSender<InboundEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            debug!(user = %user, "Session worker started");
            while let Some(event) = rx.recv().await {
                dispatcher.handle_event(event).await;
            }
            debug!(user = %user, "Session worker stopped");
        });
        tx
    }

    /// Number of users with a live worker.
    pub fn active_sessions(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockSynthesizer, MockTransport, ScriptedBackend, ScriptedImageBackend};
    use courier_backend::BackendRegistry;
    use courier_core::config::ChatConfig;
    use courier_core::events::EventKind;
    use courier_core::types::{BackendKind, Role};
    use courier_store::PreferenceStore;
    use std::time::Duration;

    fn gate_with_backend(
        backend: ScriptedBackend,
    ) -> (Arc<SessionGate>, Arc<PreferenceStore>, Arc<MockTransport>) {
        let store = Arc::new(PreferenceStore::new(None));
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(backend));
        registry.register(Arc::new(ScriptedImageBackend::new()));
        let transport = Arc::new(MockTransport::new());
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            Arc::new(registry),
            transport.clone(),
            Arc::new(MockSynthesizer::ok()),
            &ChatConfig::default(),
        ));
        (Arc::new(SessionGate::new(dispatcher)), store, transport)
    }

    fn text_event(user: UserId, text: &str) -> InboundEvent {
        InboundEvent {
            user,
            kind: EventKind::Text(text.to_string()),
        }
    }

    async fn settle() {
        // Workers are unbounded-channel consumers; a short sleep lets them
        // drain in tests.
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    #[tokio::test]
    async fn test_single_user_events_in_arrival_order() {
        // The backend delay makes out-of-order handling observable: if two
        // events ran concurrently the second would append its user turn
        // before the first's assistant turn.
        let backend = ScriptedBackend::text(BackendKind::TextA)
            .with_delay(Duration::from_millis(20));
        let (gate, store, _) = gate_with_backend(backend);

        let user = UserId(7);
        for i in 0..4 {
            gate.submit(text_event(user, &format!("msg {}", i)));
        }
        settle().await;

        let history = store.history(user);
        assert_eq!(history.len(), 8);
        for (i, turn) in history.iter().enumerate() {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            assert_eq!(turn.role, expected, "turn {}", i);
        }
        assert_eq!(history[0].content, "msg 0");
        assert_eq!(history[6].content, "msg 3");
    }

    #[tokio::test]
    async fn test_users_processed_independently() {
        let backend = ScriptedBackend::text(BackendKind::TextA)
            .with_delay(Duration::from_millis(20));
        let (gate, store, _) = gate_with_backend(backend);

        for user in [UserId(1), UserId(2), UserId(3)] {
            gate.submit(text_event(user, "hello"));
            gate.submit(text_event(user, "again"));
        }
        settle().await;

        assert_eq!(gate.active_sessions(), 3);
        for user in [UserId(1), UserId(2), UserId(3)] {
            let history = store.history(user);
            assert_eq!(history.len(), 4, "user {}", user);
            assert_eq!(history[0].content, "hello");
            assert_eq!(history[2].content, "again");
        }
    }

    #[tokio::test]
    async fn test_worker_survives_backend_failures() {
        let backend = ScriptedBackend::text(BackendKind::TextA).with_replies(vec![
            Err(courier_backend::BackendError::Timeout),
            Ok("recovered".to_string()),
        ]);
        let (gate, store, transport) = gate_with_backend(backend);

        let user = UserId(9);
        gate.submit(text_event(user, "first"));
        gate.submit(text_event(user, "second"));
        settle().await;

        // The failure produced a notice and the loop kept going.
        let texts = transport.texts_for(user);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1], "recovered");
        assert_eq!(store.history(user).iter().filter(|t| t.role == Role::Assistant).count(), 1);
    }

    #[tokio::test]
    async fn test_run_drains_transport() {
        let (gate, store, transport) = gate_with_backend(ScriptedBackend::text(BackendKind::TextA));
        transport.queue_event(text_event(UserId(4), "queued one"));
        transport.queue_event(text_event(UserId(5), "queued two"));

        gate.clone().run(transport.clone()).await;
        settle().await;

        assert_eq!(store.history(UserId(4)).len(), 2);
        assert_eq!(store.history(UserId(5)).len(), 2);
    }
}
