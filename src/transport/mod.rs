//! Transport layer.
//!
//! The client never touches a socket directly. It is handed a [`Transport`]
//! to write command text to, and an [`Inbound`] stream on which the
//! transport delivers every received message in arrival order.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    Transport::send     ┌─────────────────┐
//! │                 │───────────────────────►│                 │
//! │     Client      │                        │    Transport    │◄──► remote end
//! │   (dispatch)    │◄───────────────────────│   (I/O loop)    │
//! └─────────────────┘        Inbound         └─────────────────┘
//! ```
//!
//! When the transport terminates, it drops its end of [`Inbound`]. The
//! client takes the end of the stream as the end of the connection.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | WebSocket transport and I/O loop |
//! | `memory` | In-process loopback transport |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

/// In-process loopback transport.
pub mod memory;

/// WebSocket transport and I/O loop.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use memory::{MemoryTransport, RemoteEnd};
pub use websocket::WebSocketTransport;

// ============================================================================
// Types
// ============================================================================

/// Stream of raw inbound message text, in arrival order.
pub type Inbound = mpsc::UnboundedReceiver<String>;

// ============================================================================
// Transport
// ============================================================================

/// A message-oriented connection to the remote end.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submits one message for delivery.
    ///
    /// Returns once the message is queued; it does not wait for the write.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// if the connection is not open.
    fn send(&self, text: String) -> Result<()>;

    /// Closes the connection.
    ///
    /// After this returns, the transport's [`Inbound`] stream ends.
    async fn close(&self) -> Result<()>;
}
