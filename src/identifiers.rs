//! Type-safe identifiers.
//!
//! Commands are correlated with their responses by a [`CommandId`]. Each
//! client allocates ids from its own [`IdSequence`], so ids are unique for
//! the lifetime of one client and are never reused.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Identifier correlating a command with its response.
///
/// Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(u64);

impl CommandId {
    /// Creates an id from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CommandId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// ============================================================================
// IdSequence
// ============================================================================

/// Monotonic [`CommandId`] allocator starting at 1.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    /// Creates a sequence whose first id is 1.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocates the next id.
    #[inline]
    pub fn next(&self) -> CommandId {
        CommandId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the id the next call to [`next`](Self::next) will allocate.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> CommandId {
        CommandId(self.next.load(Ordering::Relaxed))
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_sequence_starts_at_one() {
        let ids = IdSequence::new();
        assert_eq!(ids.peek(), CommandId::new(1));
        assert_eq!(ids.next(), CommandId::new(1));
        assert_eq!(ids.next(), CommandId::new(2));
        assert_eq!(ids.peek(), CommandId::new(3));
    }

    #[test]
    fn test_sequence_unique_across_threads() {
        let ids = Arc::new(IdSequence::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..100).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().expect("thread") {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 800);
    }

    #[test]
    fn test_command_id_serde_is_bare_integer() {
        let json = serde_json::to_string(&CommandId::new(7)).expect("serialize");
        assert_eq!(json, "7");

        let id: CommandId = serde_json::from_str("42").expect("parse");
        assert_eq!(id.as_u64(), 42);
        assert_eq!(id.to_string(), "42");
    }
}
