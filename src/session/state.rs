//! Session lifecycle states.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// SessionState
// ============================================================================

/// Lifecycle state of a [`Session`](super::Session).
///
/// ```text
/// Idle ──enable──► Connecting ──open──► Open ──disable──► Closing
///                     ▲                  │                   │
///                     │              abnormal close          │
///                     │                  ▼                   ▼
///                     └──reconnect─── Closed ◄───────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Never enabled.
    #[default]
    Idle,
    /// Opening handshake in progress.
    Connecting,
    /// Socket open; commands can be sent.
    Open,
    /// Normal closure requested, waiting for the socket to finish.
    Closing,
    /// No socket. A reconnect may be pending.
    Closed,
}

impl SessionState {
    /// Returns `true` while a socket is being opened or is open.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
