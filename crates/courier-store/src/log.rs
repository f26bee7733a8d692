//! Bounded, append-only conversation log.

use std::collections::VecDeque;

use courier_core::types::{Role, Turn};
use serde::{Deserialize, Serialize};

/// Ordered sequence of turns belonging to exactly one user.
///
/// Turns are immutable once appended and are replayed to the text backends
/// in strict insertion order. Turns normally alternate starting with a user
/// turn, but the log tolerates any sequence (the image-analysis path appends
/// marker turns, and the cap can drop a leading user turn) and simply
/// forwards what exists.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: VecDeque<Turn>,
    /// Optional context cap; oldest turns are dropped first when exceeded.
    max_turns: Option<usize>,
}

impl ConversationLog {
    /// Create an empty log with an optional maximum-turns cap.
    pub fn new(max_turns: Option<usize>) -> Self {
        Self {
            turns: VecDeque::new(),
            max_turns,
        }
    }

    /// Append a turn, dropping the oldest turns if the cap is exceeded.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        if let Some(cap) = self.max_turns {
            while self.turns.len() > cap {
                self.turns.pop_front();
            }
        }
    }

    /// The current turns in insertion order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Remove all turns. Preferences are not this type's concern.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Role of the most recent turn, if any.
    pub fn last_role(&self) -> Option<Role> {
        self.turns.back().map(|t| t.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_log_is_empty() {
        let log = ConversationLog::new(None);
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.snapshot().is_empty());
        assert!(log.last_role().is_none());
    }

    #[test]
    fn test_push_preserves_insertion_order() {
        let mut log = ConversationLog::new(None);
        log.push(Turn::user("one"));
        log.push(Turn::assistant("two"));
        log.push(Turn::user("three"));

        let turns = log.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].content, "one");
        assert_eq!(turns[1].content, "two");
        assert_eq!(turns[2].content, "three");
    }

    #[test]
    fn test_cap_drops_oldest_first() {
        let mut log = ConversationLog::new(Some(2));
        log.push(Turn::user("a"));
        log.push(Turn::assistant("b"));
        log.push(Turn::user("c"));

        let turns = log.snapshot();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "b");
        assert_eq!(turns[1].content, "c");
    }

    #[test]
    fn test_no_cap_keeps_everything() {
        let mut log = ConversationLog::new(None);
        for i in 0..200 {
            log.push(Turn::user(format!("turn {}", i)));
        }
        assert_eq!(log.len(), 200);
    }

    #[test]
    fn test_tolerates_consecutive_user_turns() {
        // The log imposes no alternation; it forwards whatever sequence the
        // caller appended.
        let mut log = ConversationLog::new(None);
        log.push(Turn::user("first"));
        log.push(Turn::user("second"));

        let turns = log.snapshot();
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].role, Role::User);
    }

    #[test]
    fn test_clear() {
        let mut log = ConversationLog::new(Some(10));
        log.push(Turn::user("hello"));
        log.push(Turn::assistant("hi"));
        log.clear();
        assert!(log.is_empty());

        // Cap survives a clear.
        for i in 0..20 {
            log.push(Turn::user(format!("{}", i)));
        }
        assert_eq!(log.len(), 10);
    }

    #[test]
    fn test_last_role() {
        let mut log = ConversationLog::new(None);
        log.push(Turn::user("hello"));
        assert_eq!(log.last_role(), Some(Role::User));
        log.push(Turn::assistant("hi"));
        assert_eq!(log.last_role(), Some(Role::Assistant));
    }

    #[test]
    fn test_cap_of_zero_keeps_nothing() {
        let mut log = ConversationLog::new(Some(0));
        log.push(Turn::user("dropped"));
        assert!(log.is_empty());
    }
}
