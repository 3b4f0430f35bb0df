//! Event message type.
//!
//! Events are unsolicited notifications from the remote end. They carry no
//! id, which is what tells them apart from responses.
//!
//! # Format
//!
//! ```json
//! {
//!   "method": "module.eventName",
//!   "params": { ... }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use super::Params;

// ============================================================================
// Event
// ============================================================================

/// An event notification from remote end to local end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name in `module.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Params,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Returns the module name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event::new("browsingContext.load", Params::new());
    /// assert_eq!(event.module(), "browsingContext");
    /// ```
    #[inline]
    #[must_use]
    pub fn module(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name from the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Event::new("browsingContext.load", Params::new());
    /// assert_eq!(event.event_name(), "load");
    /// ```
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split('.').nth(1).unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn test_event_parse() {
        let json_str = r#"{
            "method": "browsingContext.load",
            "params": {"context": "abc", "url": "https://example.com"}
        }"#;

        let event: Event = serde_json::from_str(json_str).expect("parse");
        assert_eq!(event.method, "browsingContext.load");
        assert_eq!(event.params.get("context"), Some(&json!("abc")));
    }

    #[test]
    fn test_event_without_params() {
        let event: Event = serde_json::from_str(r#"{"method": "log.entryAdded"}"#).expect("parse");
        assert!(event.params.is_empty());
    }

    #[test]
    fn test_module_and_event_name() {
        let event = Event::new("network.beforeRequestSent", Params::new());
        assert_eq!(event.module(), "network");
        assert_eq!(event.event_name(), "beforeRequestSent");
    }

    #[test]
    fn test_method_without_module() {
        let event = Event::new("ping", Params::new());
        assert_eq!(event.module(), "ping");
        assert_eq!(event.event_name(), "");
    }
}
