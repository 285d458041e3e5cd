//! Error types for the stream session.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use cbot_stream::{CommandRequest, Result, Session};
//!
//! fn ping(session: &Session) -> Result<()> {
//!     session.send(CommandRequest::cmd("ping"))?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidEndpoint`] |
//! | Session | [`Error::NotConnected`], [`Error::ConnectionClosed`] |
//! | Protocol | [`Error::MalformedFrame`] |
//! | Transport | [`Error::Transport`], [`Error::WebSocket`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::session::SessionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// None of these conditions is fatal to a [`Session`](crate::Session): each
/// leaves it in a well-defined state from which `enable()` or the reconnect
/// policy can recover.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by the builder when options are inconsistent.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Endpoint is not a valid URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Send attempted while the session is not open.
    ///
    /// Recoverable: retry once the session reports `Open` again.
    #[error("Not connected (session is {state})")]
    NotConnected {
        /// State the session was in when the send was rejected.
        state: SessionState,
    },

    /// The socket writer went away while a frame was being queued.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound bytes do not form a valid frame envelope.
    ///
    /// The offending frame is dropped; the session keeps running.
    #[error("Malformed frame: {message}")]
    MalformedFrame {
        /// Description of what was wrong with the frame.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Socket failure during open or send.
    ///
    /// Handled like any other abnormal closure by the session.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// WebSocket handshake failure.
    ///
    /// Reported as an abnormal closure by the connection task.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected(state: SessionState) -> Self {
        Self::NotConnected { state }
    }

    /// Creates a malformed frame error.
    #[inline]
    pub fn malformed_frame(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. }
                | Self::ConnectionClosed
                | Self::Transport { .. }
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this is a malformed frame error.
    #[inline]
    #[must_use]
    pub fn is_malformed_frame(&self) -> bool {
        matches!(self, Self::MalformedFrame { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry once the session reconnects.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. } | Self::ConnectionClosed | Self::Transport { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
