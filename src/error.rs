//! Error types for the BiDi client.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use bidi_client::{Client, Result};
//! use serde_json::json;
//!
//! async fn example(client: &Client) -> Result<()> {
//!     let tree = client.send("browsingContext.getTree", json!({})).await?;
//!     println!("{tree}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`] |
//! | Lifecycle | [`Error::Closed`] |
//! | Protocol | [`Error::Protocol`], [`Error::UnclassifiableMessage`] |
//! | Request | [`Error::InvalidArgument`], [`Error::TooManyPending`] |
//! | Dispatch | [`Error::HandlerPanic`] |
//! | External | [`Error::Json`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Failures that concern one request are delivered through that request's
/// [`ResponseFuture`](crate::ResponseFuture). Failures with no addressable
/// request only ever reach the diagnostic handler.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Transport could not be established.
    ///
    /// Returned by `connect` for invalid addresses, refused endpoints and
    /// failed WebSocket handshakes.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connect did not complete within the configured timeout.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Transport is not open, or terminated while the call was pending.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The client was closed.
    ///
    /// Rejects every call still pending when `close()` runs, and every
    /// call made afterwards.
    #[error("Client closed")]
    Closed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// The remote end answered a command with an error response.
    #[error("Protocol error: {code}: {message}")]
    Protocol {
        /// Error code from the response `error` field.
        code: String,
        /// Human-readable message from the response `message` field.
        message: String,
    },

    /// Inbound message is neither a response nor an event.
    #[error("Unclassifiable message: {reason}")]
    UnclassifiableMessage {
        /// Why the message could not be classified.
        reason: String,
        /// The raw message text.
        raw: String,
    },

    // ========================================================================
    // Request Errors
    // ========================================================================
    /// Command parameters are not a JSON object.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The pending table is full.
    #[error("Too many pending requests: {pending}/{max}")]
    TooManyPending {
        /// Entries currently pending.
        pending: usize,
        /// Configured maximum.
        max: usize,
    },

    // ========================================================================
    // Dispatch Errors
    // ========================================================================
    /// The event handler panicked while handling an event.
    ///
    /// The event is lost; dispatch carries on with the next message.
    #[error("Event handler panicked: {message}")]
    HandlerPanic {
        /// Panic payload, if it was a string.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a protocol error from a response's code and message.
    #[inline]
    pub fn protocol(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates an unclassifiable message error.
    #[inline]
    pub fn unclassifiable(reason: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::UnclassifiableMessage {
            reason: reason.into(),
            raw: raw.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a too-many-pending error.
    #[inline]
    pub fn too_many_pending(pending: usize, max: usize) -> Self {
        Self::TooManyPending { pending, max }
    }

    /// Creates a handler panic error.
    #[inline]
    pub fn handler_panic(message: impl Into<String>) -> Self {
        Self::HandlerPanic {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a transport-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the remote end rejected the command.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Returns `true` if the call was rejected because the client closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns the protocol error code, if this is a protocol error.
    #[inline]
    #[must_use]
    pub fn protocol_code(&self) -> Option<&str> {
        match self {
            Self::Protocol { code, .. } => Some(code),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::connection("failed to connect");
        assert_eq!(err.to_string(), "Connection failed: failed to connect");
    }

    #[test]
    fn test_protocol_display_contains_code_and_message() {
        let err = Error::protocol("InvalidArgument", "bad x");
        assert_eq!(err.to_string(), "Protocol error: InvalidArgument: bad x");
        assert_eq!(err.protocol_code(), Some("InvalidArgument"));
    }

    #[test]
    fn test_is_connection_error() {
        assert!(Error::connection("test").is_connection_error());
        assert!(Error::connection_timeout(1000).is_connection_error());
        assert!(Error::ConnectionClosed.is_connection_error());
        assert!(!Error::Closed.is_connection_error());
        assert!(!Error::protocol("e", "m").is_connection_error());
    }

    #[test]
    fn test_is_closed() {
        assert!(Error::Closed.is_closed());
        assert!(!Error::ConnectionClosed.is_closed());
    }

    #[test]
    fn test_is_protocol_error() {
        assert!(Error::protocol("e", "m").is_protocol_error());
        assert!(!Error::unclassifiable("no id", "{}").is_protocol_error());
        assert_eq!(Error::Closed.protocol_code(), None);
    }

    #[test]
    fn test_too_many_pending_display() {
        let err = Error::too_many_pending(4, 4);
        assert_eq!(err.to_string(), "Too many pending requests: 4/4");
    }

    #[test]
    fn test_handler_panic_display() {
        let err = Error::handler_panic("boom");
        assert_eq!(err.to_string(), "Event handler panicked: boom");
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
