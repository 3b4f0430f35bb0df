//! Outbound command message.
//!
//! # Format
//!
//! ```json
//! {
//!   "id": 1,
//!   "method": "module.methodName",
//!   "params": { ... }
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

// ============================================================================
// Types
// ============================================================================

/// Command parameters: a JSON object.
pub type Params = Map<String, Value>;

// ============================================================================
// Command
// ============================================================================

/// A command from local end to remote end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Unique identifier for command/response correlation.
    pub id: CommandId,

    /// Method name in `module.methodName` format.
    pub method: String,

    /// Method parameters.
    #[serde(default)]
    pub params: Params,
}

impl Command {
    /// Creates a command from any JSON params value.
    ///
    /// `null` is sent as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `params` is neither an object
    /// nor `null`.
    pub fn new(id: CommandId, method: impl Into<String>, params: Value) -> Result<Self> {
        let method = method.into();
        let params = match params {
            Value::Object(map) => map,
            Value::Null => Params::new(),
            other => {
                return Err(Error::invalid_argument(format!(
                    "params for {method} must be an object, got {}",
                    json_type_name(&other)
                )));
            }
        };

        Ok(Self { id, method, params })
    }

    /// Creates a command from an already-built params map.
    #[inline]
    #[must_use]
    pub fn with_params(id: CommandId, method: impl Into<String>, params: Params) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Serializes the command to wire text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_text(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================
