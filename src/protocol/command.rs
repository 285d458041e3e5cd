//! Outbound command requests.
//!
//! # Format
//!
//! Structured command:
//! ```json
//! { "cmd": "info", "args": ["3"], "kwargs": {} }
//! ```
//!
//! Raw command line, parsed by the server:
//! ```json
//! { "raw_input": "get 3" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, to_string};

use crate::error::Result;

// ============================================================================
// CommandRequest
// ============================================================================

/// An instruction sent to the server.
///
/// Built per call and never retained by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandRequest {
    /// Named command with positional and keyword arguments.
    Structured {
        /// Command name.
        cmd: String,
        /// Positional arguments, order preserved.
        #[serde(default)]
        args: Vec<String>,
        /// Keyword arguments.
        #[serde(default)]
        kwargs: Map<String, Value>,
    },

    /// Free-form command line.
    Raw {
        /// Command text as typed by a user.
        #[serde(rename = "raw_input")]
        text: String,
    },
}

impl CommandRequest {
    /// Creates a structured command with arguments.
    #[inline]
    #[must_use]
    pub fn structured(
        cmd: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        kwargs: Map<String, Value>,
    ) -> Self {
        Self::Structured {
            cmd: cmd.into(),
            args: args.into_iter().map(Into::into).collect(),
            kwargs,
        }
    }

    /// Creates a structured command without arguments.
    #[inline]
    #[must_use]
    pub fn cmd(cmd: impl Into<String>) -> Self {
        Self::Structured {
            cmd: cmd.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    /// Creates a raw command line.
    #[inline]
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Self::Raw { text: text.into() }
    }

    /// Appends a positional argument to a structured command.
    ///
    /// No-op on raw commands.
    #[must_use]
    pub fn arg(mut self, value: impl Into<String>) -> Self {
        if let Self::Structured { ref mut args, .. } = self {
            args.push(value.into());
        }
        self
    }

    /// Sets a keyword argument on a structured command.
    ///
    /// No-op on raw commands.
    #[must_use]
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Self::Structured { ref mut kwargs, .. } = self {
            kwargs.insert(key.into(), value.into());
        }
        self
    }

    /// Returns the command name, or `None` for raw commands.
    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Structured { cmd, .. } => Some(cmd),
            Self::Raw { .. } => None,
        }
    }

    /// Encodes the command as a JSON text frame.
    ///
    /// Strings, string vectors and JSON maps always serialize, so this only
    /// fails if serde_json itself does.
    pub fn encode(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================
