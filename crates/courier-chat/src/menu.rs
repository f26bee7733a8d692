//! Pending inline-selection tracking.
//!
//! A menu shown to a user records a `PendingSelection` keyed by
//! `(UserId, token)`. The selection callback consumes the entry exactly
//! once and applies it to the preference store. Menus are advisory UI
//! state: a stale entry never blocks unrelated events, and the map is
//! bounded so abandoned menus cannot accumulate.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use courier_core::events::MenuOption;
use courier_core::types::{BackendKind, UserId};
use courier_store::PreferenceStore;
use tracing::debug;
use uuid::Uuid;

/// Which choice a shown menu offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuKind {
    ModelSelect,
    VoiceToggle,
}

/// The applied result of a selection callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuOutcome {
    BackendSelected(BackendKind),
    VoiceToggled(bool),
}

struct PendingSelection {
    kind: MenuKind,
    created_at: DateTime<Utc>,
}

/// Tracks menus awaiting a selection callback.
pub struct MenuStateMachine {
    pending: Mutex<HashMap<(UserId, Uuid), PendingSelection>>,
    /// Maximum pending entries; the oldest is evicted when full.
    cap: usize,
}

impl MenuStateMachine {
    pub fn new(cap: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            cap: cap.max(1),
        }
    }

    /// Options for the model-selection menu.
    pub fn model_options() -> Vec<MenuOption> {
        vec![
            MenuOption::new("Text model A", "model_text_a"),
            MenuOption::new("Text model B", "model_text_b"),
            MenuOption::new("Vision model", "model_vision"),
        ]
    }

    /// Options for the voice menu, labeled for the action it will take.
    pub fn voice_options(voice_enabled: bool) -> Vec<MenuOption> {
        let label = if voice_enabled {
            "Turn voice replies off"
        } else {
            "Turn voice replies on"
        };
        vec![MenuOption::new(label, "toggle_voice")]
    }

    /// Record a shown menu under the transport-issued token.
    pub fn record(&self, user: UserId, token: Uuid, kind: MenuKind) {
        let mut pending = self.lock();
        if pending.len() >= self.cap {
            // Evict the oldest pending menu; abandoned menus expire silently.
            if let Some(oldest) = pending
                .iter()
                .min_by_key(|(_, p)| p.created_at)
                .map(|(key, _)| *key)
            {
                pending.remove(&oldest);
            }
        }
        pending.insert(
            (user, token),
            PendingSelection {
                kind,
                created_at: Utc::now(),
            },
        );
    }

    /// Apply a selection callback against the preference store.
    ///
    /// Returns `None` with no state change when the token is unknown
    /// (already consumed, evicted, or never issued) or the selection data is
    /// unrecognized; duplicate callbacks are therefore idempotent.
    pub fn apply(
        &self,
        user: UserId,
        token: Uuid,
        data: &str,
        store: &PreferenceStore,
    ) -> Option<MenuOutcome> {
        let kind = {
            let pending = self.lock();
            match pending.get(&(user, token)) {
                Some(p) => p.kind,
                None => {
                    debug!(user = %user, %token, "Callback for unknown menu token ignored");
                    return None;
                }
            }
        };

        let outcome = match kind {
            MenuKind::ModelSelect => {
                let backend = data
                    .strip_prefix("model_")
                    .and_then(|name| BackendKind::from_str(name).ok())
                    .filter(BackendKind::is_conversational)?;
                store.set_backend(user, backend);
                MenuOutcome::BackendSelected(backend)
            }
            MenuKind::VoiceToggle => {
                if data != "toggle_voice" {
                    return None;
                }
                MenuOutcome::VoiceToggled(store.toggle_voice(user))
            }
        };

        // Consume only after a recognized selection applied cleanly.
        self.lock().remove(&(user, token));
        debug!(user = %user, %token, ?outcome, "Menu selection applied");
        Some(outcome)
    }

    /// Number of menus still awaiting a selection.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<(UserId, Uuid), PendingSelection>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
