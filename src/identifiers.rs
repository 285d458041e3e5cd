//! Type-safe identifier wrappers.
//!
//! Newtypes prevent mixing a task id from the server with the local socket
//! generation counter.
//!
//! | Type | Source | Meaning |
//! |------|--------|---------|
//! | [`TaskId`] | server payloads (`taskId`) | Task an event belongs to, `0` = unscoped |
//! | [`ConnectionId`] | session | Generation of the physical socket |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// TaskId
// ============================================================================

/// Identifier of a server-side task.
///
/// Unsigned, so it can never be negative. `0` means the event is not scoped
/// to any task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(u64);

impl TaskId {
    /// The unscoped task id.
    pub const UNSCOPED: Self = Self(0);

    /// Creates a task id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns `true` for the unscoped id.
    #[inline]
    #[must_use]
    pub const fn is_unscoped(&self) -> bool {
        self.0 == 0
    }

    /// Reads a task id out of a loosely typed JSON value.
    ///
    /// Accepts non-negative integers, integral floats and decimal strings.
    /// Anything else (missing, negative, fractional, garbage) is unscoped.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        let id = match value {
            Some(Value::Number(n)) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        Self(id.unwrap_or_default())
    }
}

impl From<u64> for TaskId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ConnectionId
// ============================================================================

/// Generation counter of a session's physical socket.
///
/// Bumped every time the session opens a new socket, so callbacks from a
/// socket that has since been replaced can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Returns the id following this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw generation number.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
