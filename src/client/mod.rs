//! Correlating client.
//!
//! A [`Client`] owns the command id sequence, the table of pending
//! commands and the event subscriber slot. Commands go out through the
//! transport; a dispatch task routes what comes back.
//!
//! # Command Lifecycle
//!
//! ```text
//! send ──► Pending ──► Resolved            (success response)
//!             │   └──► Rejected(Protocol)  (error response)
//!             ├──────► Rejected(Closed)    (close)
//!             ├──────► Rejected(ConnectionClosed)  (connection dropped)
//!             └──────► Abandoned           (future dropped)
//! ```
//!
//! Every transition is terminal.
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Client struct, connect, send, subscriptions, close |
//! | `dispatch` | Inbound routing task |
//! | `pending` | Pending command table |
//! | `call` | `ResponseFuture` |
//! | `options` | `ClientOptions` and `UnrecognizedPolicy` |

// ============================================================================
// Submodules
// ============================================================================

mod call;
mod core;
mod dispatch;
mod options;
mod pending;

// ============================================================================
// Re-exports
// ============================================================================

pub use call::ResponseFuture;
pub use core::{Client, DiagnosticHandler, EventHandler};
pub use options::{ClientOptions, DEFAULT_CONNECT_TIMEOUT, UnrecognizedPolicy};
