//! Client struct, connection setup and the command API.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, IdSequence};
use crate::protocol::{Command, Event};
use crate::transport::{Inbound, Transport, WebSocketTransport};

use super::call::ResponseFuture;
use super::dispatch::run_dispatch_loop;
use super::options::ClientOptions;
use super::pending::{CloseReason, CompletionReceiver, PendingTable};

// ============================================================================
// Types
// ============================================================================

/// Event handler callback type.
///
/// Called on the dispatch task for each event, in arrival order. It must
/// not block; hand long work off to another task.
pub type EventHandler = Arc<dyn Fn(Event) + Send + Sync>;

/// Diagnostic handler callback type.
///
/// Receives failures that concern no pending command, such as
/// [`Error::UnclassifiableMessage`].
pub type DiagnosticHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Internal shared state for a client.
pub(crate) struct ClientInner {
    /// Connection to the remote end.
    pub transport: Box<dyn Transport>,
    /// Command id allocator.
    pub ids: IdSequence,
    /// Outstanding commands.
    pub pending: Arc<Mutex<PendingTable>>,
    /// Single event subscriber slot.
    pub event_handler: Mutex<Option<EventHandler>>,
    /// Single diagnostic subscriber slot.
    pub diagnostic_handler: Mutex<Option<DiagnosticHandler>>,
    /// Configuration.
    pub options: ClientOptions,
    /// Set by the first `close()`.
    pub closing: AtomicBool,
}

// ============================================================================
// Client
// ============================================================================

/// A correlating BiDi client.
///
/// Multiplexes commands and events over one connection. Cloning is cheap
/// and every clone drives the same connection.
///
/// # Example
///
/// ```ignore
/// let client = Client::connect("ws://127.0.0.1:9222/session").await?;
///
/// client.on_event(|event| println!("{}: {:?}", event.method, event.params));
///
/// let status = client.send("session.status", json!({})).await?;
/// client.close().await?;
/// ```
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("next_id", &self.inner.ids.peek())
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client - Construction
// ============================================================================

impl Client {
    /// Connects to a WebSocket endpoint with default options.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the endpoint cannot be reached
    /// - [`Error::ConnectionTimeout`] if the handshake takes longer than 30s
    pub async fn connect(address: &str) -> Result<Self> {
        Self::connect_with(address, ClientOptions::default()).await
    }

    /// Connects to a WebSocket endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the endpoint cannot be reached
    /// - [`Error::ConnectionTimeout`] if the handshake takes longer than
    ///   `options.connect_timeout`
    pub async fn connect_with(address: &str, options: ClientOptions) -> Result<Self> {
        let (transport, inbound) =
            WebSocketTransport::connect(address, options.connect_timeout).await?;

        Ok(Self::with_transport(transport, inbound, options))
    }

    /// Creates a client over an established transport.
    ///
    /// Spawns the dispatch task internally, so this must be called from
    /// within a tokio runtime.
    pub fn with_transport<T>(transport: T, inbound: Inbound, options: ClientOptions) -> Self
    where
        T: Transport + 'static,
    {
        let inner = Arc::new(ClientInner {
            transport: Box::new(transport),
            ids: IdSequence::new(),
            pending: Arc::new(Mutex::new(PendingTable::new())),
            event_handler: Mutex::new(None),
            diagnostic_handler: Mutex::new(None),
            options,
            closing: AtomicBool::new(false),
        });

        tokio::spawn(run_dispatch_loop(Arc::downgrade(&inner), inbound));

        debug!("Client created");

        Self { inner }
    }
}

// ============================================================================
// Client - Commands
// ============================================================================

impl Client {
    /// Sends a command.
    ///
    /// The id is allocated, the command registered and handed to the
    /// transport before this returns. `params` must be a JSON object, or
    /// `null` for no parameters.
    ///
    /// The returned future fails immediately with:
    ///
    /// - [`Error::InvalidArgument`] if `params` is not an object
    /// - [`Error::TooManyPending`] if the configured limit is reached
    /// - [`Error::Closed`] after [`close`](Self::close)
    /// - [`Error::ConnectionClosed`] or the transport's error if the
    ///   transport refuses the message
    ///
    /// Otherwise it resolves with the response `result`, or fails with
    /// [`Error::Protocol`] for an error response, [`Error::Closed`] if the
    /// client closes first, or [`Error::ConnectionClosed`] if the
    /// connection drops first.
    pub fn send(&self, method: impl Into<String>, params: Value) -> ResponseFuture {
        let id = self.inner.ids.next();

        match self.inner.submit(id, method.into(), params) {
            Ok(receiver) => {
                ResponseFuture::waiting(id, receiver, Arc::downgrade(&self.inner.pending))
            }
            Err(e) => ResponseFuture::failed(id, e),
        }
    }

    /// Sends a command and deserializes its result.
    ///
    /// # Errors
    ///
    /// Everything [`send`](Self::send) can fail with, plus
    /// [`Error::Json`] if the result does not deserialize into `T`.
    pub async fn call<T>(&self, method: impl Into<String>, params: Value) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let result = self.send(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }
}

// ============================================================================
// Client - Subscriptions
// ============================================================================

impl Client {
    /// Installs the event handler, replacing any previous one.
    ///
    /// Events that arrive while no handler is installed are dropped.
    pub fn on_event<F>(&self, handler: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        let previous = self.inner.event_handler.lock().replace(Arc::new(handler));
        if previous.is_some() {
            debug!("Event handler replaced");
        }
    }

    /// Removes the event handler.
    pub fn clear_event_handler(&self) {
        self.inner.event_handler.lock().take();
    }

    /// Installs the diagnostic handler, replacing any previous one.
    ///
    /// Only called under [`UnrecognizedPolicy::Report`](super::UnrecognizedPolicy::Report).
    pub fn on_diagnostic<F>(&self, handler: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        *self.inner.diagnostic_handler.lock() = Some(Arc::new(handler));
    }
}

// ============================================================================
// Client - Lifecycle
// ============================================================================

impl Client {
    /// Closes the client.
    ///
    /// Every pending command fails with [`Error::Closed`], then the
    /// transport is closed. Calling this again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if teardown fails. Pending commands
    /// have been rejected regardless.
    pub async fn close(&self) -> Result<()> {
        if self.inner.closing.swap(true, Ordering::AcqRel) {
            debug!("Client already closed");
            return Ok(());
        }

        let entries = self.inner.pending.lock().close(CloseReason::Closed);
        let count = entries.len();

        for entry in entries {
            trace!(id = %entry.id(), "Rejecting pending command");
            entry.reject(Error::Closed);
        }

        if count > 0 {
            debug!(count, "Rejected pending commands on close");
        }

        self.inner
            .transport
            .close()
            .await
            .inspect_err(|e| warn!(error = %e, "Transport close failed"))
    }

    /// Returns the number of pending commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Returns `true` if the command is still waiting for its response.
    #[inline]
    #[must_use]
    pub fn is_pending(&self, id: CommandId) -> bool {
        self.inner.pending.lock().contains(id)
    }

    /// Returns `true` after [`close`](Self::close) or once the connection
    /// has dropped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.pending.lock().close_reason().is_some()
    }

    /// Returns the client's options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }
}

// ============================================================================
// ClientInner
// ============================================================================

impl ClientInner {
    /// Registers and transmits one command.
    fn submit(&self, id: CommandId, method: String, params: Value) -> Result<CompletionReceiver> {
        let command = Command::new(id, method, params)?;
        let text = command.to_text()?;

        let receiver = self
            .pending
            .lock()
            .register(id, self.options.max_pending)?;

        trace!(%id, method = %command.method, message = %text, "Sending command");

        if let Err(e) = self.transport.send(text) {
            self.pending.lock().take(id);
            warn!(%id, method = %command.method, error = %e, "Transport rejected command");
            return Err(e);
        }

        Ok(receiver)
    }
}

// ============================================================================
// Tests
// ============================================================================
