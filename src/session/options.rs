//! Resolved session options.
//!
//! Produced by [`SessionBuilder::build`](super::SessionBuilder::build) after
//! validation; immutable for the life of the session.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use url::Url;

use crate::dispatch::DEFAULT_EVENT_CAPACITY;

// ============================================================================
// Constants
// ============================================================================

/// Port the stream server listens on by default.
pub const DEFAULT_PORT: u16 = 2269;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Path segment of the stream endpoint, appended to the base path.
pub const STREAM_PATH: &str = "stream";

/// Delay between an abnormal closure and the reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// SessionOptions
// ============================================================================

/// Validated session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// WebSocket endpoint (`ws://` or `wss://`).
    pub endpoint: Url,

    /// Delay before reconnecting after an abnormal closure.
    pub reconnect_delay: Duration,

    /// Events buffered per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl SessionOptions {
    /// Creates options for `endpoint` with default timings.
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

// ============================================================================
// Tests
// ============================================================================
