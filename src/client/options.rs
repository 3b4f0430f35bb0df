//! Client configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use bidi_client::{ClientOptions, UnrecognizedPolicy};
//!
//! let options = ClientOptions::new()
//!     .with_connect_timeout(Duration::from_secs(5))
//!     .with_max_pending(256)
//!     .with_unrecognized(UnrecognizedPolicy::Ignore);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for establishing the connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// UnrecognizedPolicy
// ============================================================================

/// What dispatch does with inbound messages that are neither a response
/// nor an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnrecognizedPolicy {
    /// Log at debug level and drop.
    Ignore,
    /// Log a warning and pass an
    /// [`Error::UnclassifiableMessage`](crate::Error::UnclassifiableMessage)
    /// to the diagnostic handler, if one is installed.
    #[default]
    Report,
}

// ============================================================================
// ClientOptions
// ============================================================================

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Handling of unclassifiable inbound messages.
    pub unrecognized: UnrecognizedPolicy,

    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Maximum outstanding commands; `None` for no limit.
    pub max_pending: Option<usize>,
}

impl ClientOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            unrecognized: UnrecognizedPolicy::Report,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_pending: None,
        }
    }

    /// Sets the unrecognized message policy.
    #[inline]
    #[must_use]
    pub fn with_unrecognized(mut self, policy: UnrecognizedPolicy) -> Self {
        self.unrecognized = policy;
        self
    }

    /// Sets the connect timeout.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Limits the number of outstanding commands.
    #[inline]
    #[must_use]
    pub fn with_max_pending(mut self, max: usize) -> Self {
        self.max_pending = Some(max);
        self
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.unrecognized, UnrecognizedPolicy::Report);
        assert_eq!(options.connect_timeout.as_secs(), 30);
        assert_eq!(options.max_pending, None);
        assert_eq!(options, ClientOptions::new());
    }

    #[test]
    fn test_builder_chain() {
        let options = ClientOptions::new()
            .with_unrecognized(UnrecognizedPolicy::Ignore)
            .with_connect_timeout(Duration::from_millis(250))
            .with_max_pending(8);

        assert_eq!(options.unrecognized, UnrecognizedPolicy::Ignore);
        assert_eq!(options.connect_timeout, Duration::from_millis(250));
        assert_eq!(options.max_pending, Some(8));
    }
}
