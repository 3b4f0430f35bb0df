//! Eventual result of one command.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::pending::{CompletionReceiver, PendingTable};

// ============================================================================
// ResponseFuture
// ============================================================================

/// Future returned by [`Client::send`](crate::Client::send).
///
/// Resolves exactly once: with the response `result`, with
/// [`Error::Protocol`] for an error response, or with the failure that
/// prevented the command from completing.
///
/// The command is already registered and handed to the transport when
/// `send` returns, so the id is allocated whether or not this future is
/// polled. Dropping it before it resolves abandons the call: the pending
/// entry is removed and a late response is ignored as unknown.
#[must_use = "dropping a ResponseFuture abandons the command"]
pub struct ResponseFuture {
    id: CommandId,
    state: CallState,
}

enum CallState {
    Waiting {
        receiver: CompletionReceiver,
        pending: Weak<Mutex<PendingTable>>,
    },
    Failed(Error),
    Done,
}

impl ResponseFuture {
    pub(crate) fn waiting(
        id: CommandId,
        receiver: CompletionReceiver,
        pending: Weak<Mutex<PendingTable>>,
    ) -> Self {
        Self {
            id,
            state: CallState::Waiting { receiver, pending },
        }
    }

    pub(crate) fn failed(id: CommandId, error: Error) -> Self {
        Self {
            id,
            state: CallState::Failed(error),
        }
    }

    /// Returns the id allocated to this command.
    #[inline]
    #[must_use]
    pub fn id(&self) -> CommandId {
        self.id
    }
}

impl Future for ResponseFuture {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;

        match std::mem::replace(&mut this.state, CallState::Done) {
            CallState::Waiting {
                mut receiver,
                pending,
            } => match Pin::new(&mut receiver).poll(cx) {
                Poll::Pending => {
                    this.state = CallState::Waiting { receiver, pending };
                    Poll::Pending
                }
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                // Table dropped with the client while the entry was still in it.
                Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ConnectionClosed)),
            },
            CallState::Failed(error) => Poll::Ready(Err(error)),
            CallState::Done => panic!("ResponseFuture polled after completion"),
        }
    }
}

impl Drop for ResponseFuture {
    fn drop(&mut self) {
        if let CallState::Waiting { pending, .. } = &self.state
            && let Some(pending) = pending.upgrade()
            && pending.lock().take(self.id).is_some()
        {
            debug!(id = %self.id, "Abandoned pending command");
        }
    }
}

impl fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            CallState::Waiting { .. } => "waiting",
            CallState::Failed(_) => "failed",
            CallState::Done => "done",
        };

        f.debug_struct("ResponseFuture")
            .field("id", &self.id)
            .field("state", &state)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
