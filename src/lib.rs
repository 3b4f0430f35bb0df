//! BiDi Client - correlating WebDriver BiDi client.
//!
//! This library multiplexes asynchronous command/response pairs and
//! out-of-band event notifications over a single persistent connection.
//!
//! # Architecture
//!
//! The client follows a local end / remote end model:
//!
//! - **Local End (Rust)**: Sends commands with numeric ids, awaits responses
//! - **Remote End (Browser)**: Answers each command once, pushes events
//!
//! Key design principles:
//!
//! - Each [`Client`] owns: id sequence + pending table + event slot + dispatch task
//! - Protocol uses `module.methodName` method names
//! - Every sent command completes exactly once, even if the connection drops
//! - Server-side failures ([`Error::Protocol`]) are distinct from transport failures
//!
//! # Quick Start
//!
//! ```no_run
//! use bidi_client::{Client, Result};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Client::connect("ws://127.0.0.1:9222/session").await?;
//!
//!     // Install the handler before triggering activity that emits events
//!     client.on_event(|event| println!("event: {}", event.method));
//!
//!     let tree = client.send("browsingContext.getTree", json!({})).await?;
//!     println!("contexts: {tree}");
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Client`], [`ResponseFuture`], [`ClientOptions`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`CommandId`] and its sequence |
//! | [`protocol`] | Wire message types and classification |
//! | [`transport`] | [`Transport`] trait, WebSocket and in-memory transports |

// ============================================================================
// Modules
// ============================================================================

/// Correlating client.
///
/// - [`Client`] - Sends commands, routes responses and events
/// - [`ResponseFuture`] - Eventual result of one command
/// - [`ClientOptions`] - Configuration
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Protocol message types.
///
/// Command/response/event structures and inbound classification.
pub mod protocol;

/// Transport layer.
///
/// The [`Transport`] trait and its WebSocket and in-memory implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    Client, ClientOptions, DiagnosticHandler, EventHandler, ResponseFuture, UnrecognizedPolicy,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::CommandId;

// Protocol types
pub use protocol::{Command, Event, Message, Params, Response, ResponseType, classify};

// Transport types
pub use transport::{Inbound, MemoryTransport, RemoteEnd, Transport, WebSocketTransport};
