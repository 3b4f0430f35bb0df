//! Inbound dispatch.
//!
//! One task per client drains the transport's [`Inbound`] stream and
//! routes each message synchronously, in arrival order:
//!
//! | Message | Action |
//! |---------|--------|
//! | Response, known id | remove entry, resolve or reject it |
//! | Response, unknown id | log and ignore |
//! | Event | call the event handler, if any |
//! | Command or unrecognized, id pending | fail that command |
//! | Command or unrecognized, otherwise; invalid JSON | apply [`UnrecognizedPolicy`] |
//!
//! A panicking handler costs only the message it was handling. When the
//! stream ends without `close()`, or the task stops for any other reason,
//! every pending command fails with [`Error::ConnectionClosed`].

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Weak;

use serde_json::Value;
use tracing::{debug, error, trace, warn};

use crate::error::Error;
use crate::protocol::{Event, Message, Response, Unrecognized};
use crate::transport::Inbound;

use super::core::ClientInner;
use super::options::UnrecognizedPolicy;
use super::pending::CloseReason;

// ============================================================================
// Dispatch Loop
// ============================================================================

/// Runs until the inbound stream ends or the client is dropped.
pub(crate) async fn run_dispatch_loop(inner: Weak<ClientInner>, mut inbound: Inbound) {
    let _guard = DisconnectGuard(inner.clone());

    while let Some(text) = inbound.recv().await {
        let Some(inner) = inner.upgrade() else {
            debug!("Client dropped, stopping dispatch");
            return;
        };
        inner.dispatch(&text);
    }

    debug!("Dispatch loop terminated");
}

/// Fails pending commands however the dispatch task ends.
struct DisconnectGuard(Weak<ClientInner>);

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_disconnect();
        }
    }
}

// ============================================================================
// ClientInner - Dispatch
// ============================================================================

impl ClientInner {
    /// Routes one inbound message.
    pub(crate) fn dispatch(&self, text: &str) {
        trace!(message = %text, "Received message");

        let message = match Message::parse(text) {
            Ok(message) => message,
            Err(e) => {
                self.handle_unrecognized(format!("invalid JSON: {e}"), text);
                return;
            }
        };

        match message {
            Message::Response(response) => self.handle_response(response),
            Message::Event(event) => self.handle_event(event),
            Message::Command(command) => {
                if self.pending.lock().contains(command.id) {
                    debug!(id = %command.id, method = %command.method, "Reply without result");
                    self.handle_response(Response::success(command.id, Value::Null));
                    return;
                }
                self.handle_unrecognized(
                    format!("unsupported inbound command {}", command.method),
                    text,
                );
            }
            Message::Unrecognized(unrecognized) => self.handle_malformed(unrecognized, text),
        }
    }

    fn handle_response(&self, response: Response) {
        let entry = self.pending.lock().take(response.id);

        match entry {
            Some(entry) => {
                trace!(id = %response.id, success = response.is_success(), "Response matched");
                entry.complete(response);
            }
            None => {
                debug!(id = %response.id, "Response for unknown command");
            }
        }
    }

    /// Fails the command a malformed reply is addressed to, if still pending.
    fn handle_malformed(&self, unrecognized: Unrecognized, text: &str) {
        let entry = unrecognized
            .id
            .and_then(|id| self.pending.lock().take(id));

        match entry {
            Some(entry) => {
                warn!(id = %entry.id(), reason = %unrecognized.reason, "Malformed response");
                entry.reject(Error::unclassifiable(unrecognized.reason, text));
            }
            None => self.handle_unrecognized(unrecognized.reason, text),
        }
    }

    fn handle_event(&self, event: Event) {
        let handler = self.event_handler.lock().clone();

        let Some(handler) = handler else {
            trace!(method = %event.method, "No event handler, dropping event");
            return;
        };

        let method = event.method.clone();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
            let message = panic_message(payload.as_ref());
            error!(%method, panic = %message, "Event handler panicked");
            self.report(&Error::handler_panic(message));
        }
    }

    fn handle_unrecognized(&self, reason: String, text: &str) {
        match self.options.unrecognized {
            UnrecognizedPolicy::Ignore => {
                debug!(%reason, "Ignoring unclassifiable message");
            }
            UnrecognizedPolicy::Report => {
                warn!(%reason, message = %text, "Unclassifiable message");
                self.report(&Error::unclassifiable(reason, text));
            }
        }
    }

    /// Hands an error to the diagnostic handler, if any.
    fn report(&self, error: &Error) {
        let handler = self.diagnostic_handler.lock().clone();

        if let Some(handler) = handler
            && let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(error)))
        {
            error!(panic = %panic_message(payload.as_ref()), "Diagnostic handler panicked");
        }
    }

    /// Fails every pending command after the connection dropped.
    pub(crate) fn handle_disconnect(&self) {
        let entries = self.pending.lock().close(CloseReason::Disconnected);

        if entries.is_empty() {
            debug!("Connection ended");
            return;
        }

        warn!(count = entries.len(), "Connection ended with pending commands");
        for entry in entries {
            entry.reject(CloseReason::Disconnected.error());
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
