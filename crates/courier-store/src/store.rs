//! Per-user preference store with per-key locking.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use courier_core::types::{BackendKind, Turn, UserId};
use tracing::debug;

use crate::log::ConversationLog;

/// Mutable preference and conversation record for one user.
#[derive(Clone, Debug)]
pub struct UserState {
    /// Selected conversation backend.
    pub backend: BackendKind,
    /// Whether replies are also rendered as voice.
    pub voice_enabled: bool,
    /// Conversation history, owned exclusively by this user.
    pub history: ConversationLog,
}

impl UserState {
    fn with_cap(max_history_turns: Option<usize>) -> Self {
        Self {
            backend: BackendKind::TextA,
            voice_enabled: false,
            history: ConversationLog::new(max_history_turns),
        }
    }
}

/// Shared handle to one user's state.
///
/// Cloning the handle clones the reference, not the state, so two
/// `get_or_create` calls for the same user observe the same record.
#[derive(Clone)]
pub struct UserHandle(Arc<Mutex<UserState>>);

impl UserHandle {
    /// Whether two handles refer to the same underlying state.
    pub fn ptr_eq(a: &UserHandle, b: &UserHandle) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> UserState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, UserState> {
        // A poisoned lock only means a panic happened mid-mutation elsewhere;
        // the state itself is still coherent for our single-field updates.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mapping from user identity to mutable preference/state records.
///
/// The outer map lock is held only for lookup and insertion; each user's
/// state has its own lock, held only for the duration of a single
/// read-modify operation and never across an await point. Operations on
/// different users therefore never block each other, and arrival-order
/// serialization across a full event (including the backend call) is the
/// dispatch layer's job, not this store's.
pub struct PreferenceStore {
    users: RwLock<HashMap<UserId, UserHandle>>,
    max_history_turns: Option<usize>,
}

impl PreferenceStore {
    /// Create an empty store. New users start with backend `TextA`, voice
    /// off, and an empty history capped at `max_history_turns`.
    pub fn new(max_history_turns: Option<usize>) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            max_history_turns,
        }
    }

    /// Fetch the state handle for a user, creating the default record on
    /// first sight. Idempotent: repeated calls return the same handle.
    pub fn get_or_create(&self, user: UserId) -> UserHandle {
        {
            let users = self
                .users
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(handle) = users.get(&user) {
                return handle.clone();
            }
        }

        let mut users = self
            .users
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        users
            .entry(user)
            .or_insert_with(|| {
                debug!(user = %user, "Created default user state");
                UserHandle(Arc::new(Mutex::new(UserState::with_cap(
                    self.max_history_turns,
                ))))
            })
            .clone()
    }

    /// Set the selected conversation backend.
    pub fn set_backend(&self, user: UserId, backend: BackendKind) {
        let handle = self.get_or_create(user);
        handle.lock().backend = backend;
    }

    /// Flip the voice toggle and return the new value.
    pub fn toggle_voice(&self, user: UserId) -> bool {
        let handle = self.get_or_create(user);
        let mut state = handle.lock();
        state.voice_enabled = !state.voice_enabled;
        state.voice_enabled
    }

    /// Append a turn to the user's conversation log.
    pub fn append_turn(&self, user: UserId, turn: Turn) {
        let handle = self.get_or_create(user);
        handle.lock().history.push(turn);
    }

    /// Reset the conversation history only; preferences are preserved.
    pub fn clear(&self, user: UserId) {
        let handle = self.get_or_create(user);
        handle.lock().history.clear();
    }

    /// The user's selected conversation backend.
    pub fn backend(&self, user: UserId) -> BackendKind {
        self.get_or_create(user).lock().backend
    }

    /// Whether voice rendering is enabled for the user.
    pub fn voice_enabled(&self, user: UserId) -> bool {
        self.get_or_create(user).lock().voice_enabled
    }

    /// The user's conversation history in insertion order.
    pub fn history(&self, user: UserId) -> Vec<Turn> {
        self.get_or_create(user).lock().history.snapshot()
    }

    /// Number of users seen so far.
    pub fn user_count(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
