//! BiDi protocol message types.
//!
//! This module defines the wire format exchanged between the local end
//! (this client) and the remote end (the browser).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Command` | Local → Remote | Method call with a numeric id |
//! | `Response` | Remote → Local | Result or error for one command id |
//! | `Event` | Remote → Local | Notification, no id |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command type and params |
//! | `response` | Response and ResponseType |
//! | `event` | Event type |
//! | `message` | Inbound classification |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command.
pub mod command;

/// Event message type.
pub mod event;

/// Inbound message classification.
pub mod message;

/// Response message type.
pub mod response;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, Params};
pub use event::Event;
pub use message::{Message, MessageKind, Unrecognized, classify};
pub use response::{Response, ResponseType};
