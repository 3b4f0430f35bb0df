//! In-process loopback transport.
//!
//! [`MemoryTransport::pair`] returns the client-side transport, its
//! [`Inbound`] stream, and a [`RemoteEnd`] that plays the remote end:
//! it reads what the client sent and delivers responses and events.
//! The remote end can also simulate faults (failed writes, failed
//! teardown, dropped connection).
//!
//! # Example
//!
//! ```ignore
//! let (transport, inbound, mut remote) = MemoryTransport::pair();
//! let client = Client::with_transport(transport, inbound, ClientOptions::default());
//!
//! let call = client.send("echo", json!({"x": 1}));
//! let command = remote.recv_command().await?;
//! remote.respond(&Response::success(command.id, json!({"x": 1})))?;
//! assert_eq!(call.await?, json!({"x": 1}));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{Command, Event, Response};

use super::{Inbound, Transport};

// ============================================================================
// Shared State
// ============================================================================

/// State shared by both ends of the pair.
#[derive(Default)]
struct Shared {
    /// Sender half of the client's Inbound; `None` once disconnected.
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Set by close or disconnect.
    closed: AtomicBool,
    /// Fail every send with a connection error.
    fail_sends: AtomicBool,
    /// Error message returned by the next close.
    close_error: Mutex<Option<String>>,
    /// Number of close calls.
    close_calls: AtomicUsize,
}

impl Shared {
    fn disconnect(&self) {
        self.closed.store(true, Ordering::Release);
        self.inbound_tx.lock().take();
    }
}

// ============================================================================
// MemoryTransport
// ============================================================================

/// Client side of an in-memory connection.
pub struct MemoryTransport {
    /// Messages sent by the client, read by [`RemoteEnd`].
    outbound_tx: mpsc::UnboundedSender<String>,
    shared: Arc<Shared>,
}

impl MemoryTransport {
    /// Creates a connected transport, its inbound stream and the remote end.
    #[must_use]
    pub fn pair() -> (Self, Inbound, RemoteEnd) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared::default());
        *shared.inbound_tx.lock() = Some(inbound_tx);

        let transport = Self {
            outbound_tx,
            shared: Arc::clone(&shared),
        };
        let remote = RemoteEnd {
            outbound_rx,
            shared,
        };

        (transport, inbound_rx, remote)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn send(&self, text: String) -> Result<()> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }

        if self.shared.fail_sends.load(Ordering::Acquire) {
            return Err(Error::connection("simulated send failure"));
        }

        self.outbound_tx
            .send(text)
            .map_err(|_| Error::ConnectionClosed)
    }

    async fn close(&self) -> Result<()> {
        self.shared.close_calls.fetch_add(1, Ordering::AcqRel);
        self.shared.disconnect();
        debug!("Memory transport closed");

        match self.shared.close_error.lock().take() {
            Some(message) => Err(Error::connection(message)),
            None => Ok(()),
        }
    }
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// Remote side of an in-memory connection.
pub struct RemoteEnd {
    outbound_rx: mpsc::UnboundedReceiver<String>,
    shared: Arc<Shared>,
}

impl RemoteEnd {
    /// Waits for the next message the client sent.
    ///
    /// Returns `None` once the client's transport is dropped.
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound_rx.recv().await
    }

    /// Returns the next message the client sent, if one is queued.
    pub fn try_recv(&mut self) -> Option<String> {
        self.outbound_rx.try_recv().ok()
    }

    /// Waits for the next message and decodes it as a [`Command`].
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the client's transport is gone
    /// - [`Error::Json`] if the message is not a command
    pub async fn recv_command(&mut self) -> Result<Command> {
        let text = self.recv().await.ok_or(Error::ConnectionClosed)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Delivers raw text to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close or disconnect.
    pub fn deliver(&self, text: impl Into<String>) -> Result<()> {
        let guard = self.shared.inbound_tx.lock();
        let tx = guard.as_ref().ok_or(Error::ConnectionClosed)?;
        tx.send(text.into()).map_err(|_| Error::ConnectionClosed)
    }

    /// Delivers a JSON value to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close or disconnect.
    pub fn deliver_json(&self, value: &Value) -> Result<()> {
        self.deliver(value.to_string())
    }

    /// Delivers a response to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close or disconnect.
    pub fn respond(&self, response: &Response) -> Result<()> {
        self.deliver(serde_json::to_string(response)?)
    }

    /// Delivers an event to the client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after close or disconnect.
    pub fn emit(&self, event: &Event) -> Result<()> {
        self.deliver(serde_json::to_string(event)?)
    }

    /// Drops the connection without a close handshake.
    ///
    /// The client's inbound stream ends and further sends fail.
    pub fn disconnect(&self) {
        debug!("Memory transport disconnected by remote");
        self.shared.disconnect();
    }

    /// Makes every subsequent send fail (or succeed again).
    pub fn fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::Release);
    }

    /// Makes the next close return a connection error with `message`.
    pub fn fail_close(&self, message: impl Into<String>) {
        *self.shared.close_error.lock() = Some(message.into());
    }

    /// Returns `true` after close or disconnect.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Returns how many times the client closed the transport.
    #[inline]
    #[must_use]
    pub fn close_calls(&self) -> usize {
        self.shared.close_calls.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::identifiers::CommandId;

    #[tokio::test]
    async fn test_client_to_remote() {
        let (transport, _inbound, mut remote) = MemoryTransport::pair();

        transport.send("hello".to_string()).expect("send");
        assert_eq!(remote.recv().await.as_deref(), Some("hello"));
        assert_eq!(remote.try_recv(), None);
    }

    #[tokio::test]
    async fn test_remote_to_client() {
        let (_transport, mut inbound, remote) = MemoryTransport::pair();

        remote
            .respond(&Response::success(CommandId::new(1), json!(true)))
            .expect("respond");
        let text = inbound.recv().await.expect("inbound");
        assert!(text.contains(r#""type":"success""#));
    }

    #[tokio::test]
    async fn test_recv_command() {
        let (transport, _inbound, mut remote) = MemoryTransport::pair();

        transport
            .send(r#"{"id":1,"method":"echo","params":{"x":1}}"#.to_string())
            .expect("send");
        let command = remote.recv_command().await.expect("command");
        assert_eq!(command.id, CommandId::new(1));
        assert_eq!(command.method, "echo");
    }

    #[tokio::test]
    async fn test_close_ends_inbound() {
        let (transport, mut inbound, remote) = MemoryTransport::pair();

        transport.close().await.expect("close");
        assert!(inbound.recv().await.is_none());
        assert!(remote.is_closed());
        assert_eq!(remote.close_calls(), 1);
        assert!(matches!(remote.deliver("late"), Err(Error::ConnectionClosed)));
        assert!(matches!(
            transport.send("late".to_string()),
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_simulated_faults() {
        let (transport, _inbound, remote) = MemoryTransport::pair();

        remote.fail_sends(true);
        assert!(matches!(
            transport.send("x".to_string()),
            Err(Error::Connection { .. })
        ));
        remote.fail_sends(false);
        assert!(transport.send("x".to_string()).is_ok());

        remote.fail_close("teardown failed");
        let err = transport.close().await.unwrap_err();
        assert!(err.to_string().contains("teardown failed"));
    }

    #[tokio::test]
    async fn test_disconnect() {
        let (transport, mut inbound, remote) = MemoryTransport::pair();

        remote.disconnect();
        assert!(inbound.recv().await.is_none());
        assert!(transport.send("x".to_string()).is_err());
        assert_eq!(remote.close_calls(), 0);
    }
}
