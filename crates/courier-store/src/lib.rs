//! Per-user preference and conversation state for Courier.
//!
//! Holds state for the lifetime of the process only; there is no
//! persistence layer. The store serializes access per user, never globally,
//! so events for independent users never contend on a shared lock.

pub mod log;
pub mod store;

pub use log::ConversationLog;
pub use store::{PreferenceStore, UserHandle, UserState};
