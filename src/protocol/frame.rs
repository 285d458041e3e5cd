//! Inbound frame envelope.
//!
//! # Format
//!
//! ```json
//! { "stream": "LOGGER", "data": { "ts": 1700000000.5, "taskId": 7, "msg": "hello" } }
//! ```
//!
//! Only the envelope is validated here. Fields inside `data` are optional and
//! read by the dispatcher as needed.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, from_slice};

use crate::error::{Error, Result};
use crate::identifiers::TaskId;

use super::StreamType;

// ============================================================================
// Frame
// ============================================================================

/// One decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Declared stream type.
    pub stream_type: StreamType,

    /// Arbitrary payload.
    pub data: Value,
}

impl Frame {
    /// Creates a frame.
    #[inline]
    #[must_use]
    pub fn new(stream_type: StreamType, data: Value) -> Self {
        Self { stream_type, data }
    }

    /// Decodes a frame from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedFrame`] if the bytes are not JSON, not an
    /// object, or lack a string `stream` or a `data` field.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let value: Value = from_slice(bytes)
            .map_err(|e| Error::malformed_frame(format!("invalid JSON: {e}")))?;

        let Value::Object(mut envelope) = value else {
            return Err(Error::malformed_frame("frame is not a JSON object"));
        };

        let stream_type = match envelope.remove("stream") {
            Some(Value::String(name)) => StreamType::from(name),
            Some(_) => return Err(Error::malformed_frame("`stream` is not a string")),
            None => return Err(Error::malformed_frame("missing `stream` field")),
        };

        let data = envelope
            .remove("data")
            .ok_or_else(|| Error::malformed_frame("missing `data` field"))?;

        Ok(Self { stream_type, data })
    }

    /// Returns the payload object, if the payload is one.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.data.as_object()
    }

    /// Gets a field of the payload object.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the task id declared in `data.taskId`, or unscoped.
    #[inline]
    #[must_use]
    pub fn task_id(&self) -> TaskId {
        TaskId::from_value(self.get("taskId"))
    }
}

// ============================================================================
// Tests
// ============================================================================
