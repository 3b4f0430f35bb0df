//! Pending command table.
//!
//! Maps each outstanding [`CommandId`] to the one-shot channel completing
//! its [`ResponseFuture`](super::ResponseFuture). An entry leaves the table
//! exactly once, as a [`PendingEntry`] that is consumed by completing it.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;
use crate::protocol::Response;

// ============================================================================
// Types
// ============================================================================

/// Completion side of a pending call.
pub(crate) type Completion = oneshot::Sender<Result<Value>>;

/// Awaiting side of a pending call.
pub(crate) type CompletionReceiver = oneshot::Receiver<Result<Value>>;

// ============================================================================
// CloseReason
// ============================================================================

/// Why the table stopped accepting entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseReason {
    /// `Client::close` was called.
    Closed,
    /// The transport's inbound stream ended.
    Disconnected,
}

impl CloseReason {
    /// Error delivered to calls rejected for this reason.
    pub(crate) fn error(self) -> Error {
        match self {
            Self::Closed => Error::Closed,
            Self::Disconnected => Error::ConnectionClosed,
        }
    }
}

// ============================================================================
// PendingEntry
// ============================================================================

/// An entry removed from the table, waiting to be completed.
#[derive(Debug)]
pub(crate) struct PendingEntry {
    id: CommandId,
    completion: Completion,
}

impl PendingEntry {
    /// Returns the command id.
    #[inline]
    pub(crate) fn id(&self) -> CommandId {
        self.id
    }

    /// Completes the call from a matching response.
    pub(crate) fn complete(self, response: Response) {
        self.finish(response.into_result());
    }

    /// Fails the call.
    pub(crate) fn reject(self, error: Error) {
        self.finish(Err(error));
    }

    fn finish(self, outcome: Result<Value>) {
        // Receiver gone means the caller dropped its future first.
        let _ = self.completion.send(outcome);
    }
}

// ============================================================================
// PendingTable
// ============================================================================

/// Outstanding commands keyed by id.
#[derive(Debug, Default)]
pub(crate) struct PendingTable {
    entries: FxHashMap<CommandId, Completion>,
    closed: Option<CloseReason>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a new pending command.
    ///
    /// # Errors
    ///
    /// - [`Error::Closed`] / [`Error::ConnectionClosed`] once the table is closed
    /// - [`Error::TooManyPending`] if `max_pending` entries are outstanding
    pub(crate) fn register(
        &mut self,
        id: CommandId,
        max_pending: Option<usize>,
    ) -> Result<CompletionReceiver> {
        if let Some(reason) = self.closed {
            return Err(reason.error());
        }

        if let Some(max) = max_pending
            && self.entries.len() >= max
        {
            return Err(Error::too_many_pending(self.entries.len(), max));
        }

        let (tx, rx) = oneshot::channel();
        self.entries.insert(id, tx);
        Ok(rx)
    }

    /// Removes the entry for `id`, if present.
    pub(crate) fn take(&mut self, id: CommandId) -> Option<PendingEntry> {
        self.entries
            .remove(&id)
            .map(|completion| PendingEntry { id, completion })
    }

    /// Stops accepting entries and removes every outstanding one.
    ///
    /// The first reason sticks; later calls return an empty list.
    pub(crate) fn close(&mut self, reason: CloseReason) -> Vec<PendingEntry> {
        if self.closed.is_none() {
            self.closed = Some(reason);
        }

        self.entries
            .drain()
            .map(|(id, completion)| PendingEntry { id, completion })
            .collect()
    }

    /// Returns why the table closed, if it has.
    #[inline]
    pub(crate) fn close_reason(&self) -> Option<CloseReason> {
        self.closed
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn contains(&self, id: CommandId) -> bool {
        self.entries.contains_key(&id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn id(value: u64) -> CommandId {
        CommandId::new(value)
    }

    #[test]
    fn test_register_and_complete() {
        let mut table = PendingTable::new();
        let mut rx = table.register(id(1), None).expect("register");
        assert_eq!(table.len(), 1);
        assert!(table.contains(id(1)));

        let entry = table.take(id(1)).expect("entry");
        assert_eq!(entry.id(), id(1));
        entry.complete(Response::success(id(1), json!({"x": 1})));

        assert_eq!(table.len(), 0);
        let outcome = rx.try_recv().expect("completed");
        assert_eq!(outcome.expect("success"), json!({"x": 1}));
    }

    #[test]
    fn test_error_response_rejects() {
        let mut table = PendingTable::new();
        let mut rx = table.register(id(2), None).expect("register");

        table
            .take(id(2))
            .expect("entry")
            .complete(Response::error(id(2), "InvalidArgument", "bad x"));

        let err = rx.try_recv().expect("completed").unwrap_err();
        assert_eq!(err.protocol_code(), Some("InvalidArgument"));
    }

    #[test]
    fn test_take_is_exactly_once() {
        let mut table = PendingTable::new();
        let _rx = table.register(id(3), None).expect("register");

        assert!(table.take(id(3)).is_some());
        assert!(table.take(id(3)).is_none());
    }

    #[test]
    fn test_take_unknown_id() {
        let mut table = PendingTable::new();
        assert!(table.take(id(99)).is_none());
    }

    #[test]
    fn test_close_drains_everything() {
        let mut table = PendingTable::new();
        let mut receivers: Vec<_> = (1..=5)
            .map(|n| table.register(id(n), None).expect("register"))
            .collect();

        let entries = table.close(CloseReason::Closed);
        assert_eq!(entries.len(), 5);
        assert_eq!(table.len(), 0);

        for entry in entries {
            entry.reject(CloseReason::Closed.error());
        }
        for rx in &mut receivers {
            assert!(rx.try_recv().expect("rejected").unwrap_err().is_closed());
        }
    }

    #[test]
    fn test_register_after_close_fails() {
        let mut table = PendingTable::new();
        table.close(CloseReason::Disconnected);

        let err = table.register(id(1), None).unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }

    #[test]
    fn test_first_close_reason_sticks() {
        let mut table = PendingTable::new();
        let _rx = table.register(id(1), None).expect("register");

        assert_eq!(table.close(CloseReason::Closed).len(), 1);
        assert!(table.close(CloseReason::Disconnected).is_empty());
        assert_eq!(table.close_reason(), Some(CloseReason::Closed));
    }

    #[test]
    fn test_max_pending() {
        let mut table = PendingTable::new();
        let _a = table.register(id(1), Some(2)).expect("register");
        let _b = table.register(id(2), Some(2)).expect("register");

        let err = table.register(id(3), Some(2)).unwrap_err();
        assert!(matches!(err, Error::TooManyPending { pending: 2, max: 2 }));

        table.take(id(1));
        assert!(table.register(id(4), Some(2)).is_ok());
    }

    #[test]
    fn test_reject_after_receiver_dropped() {
        let mut table = PendingTable::new();
        let rx = table.register(id(1), None).expect("register");
        drop(rx);

        // Must not panic
        table.take(id(1)).expect("entry").reject(Error::Closed);
    }
}
