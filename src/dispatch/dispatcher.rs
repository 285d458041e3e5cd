//! Frame classification and publishing.
//!
//! Each inbound payload goes through one classify-and-publish step:
//!
//! ```text
//! bytes ──decode──► Frame ──classify──► [Event, ...] ──publish──► EventBus
//!   │                 │
//!   └─► raw taps      └─► Diagnostic (malformed)
//! ```
//!
//! All events produced by one frame are published in order before the next
//! frame is looked at.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::Result;
use crate::protocol::{Event, Frame, Route};

use super::bus::EventBus;
use super::legacy::{self, format_log_line};

// ============================================================================
// Constants
// ============================================================================

/// Number of diagnostics / raw payloads buffered per receiver.
const SIDE_CHANNEL_CAPACITY: usize = 256;

// ============================================================================
// Diagnostic
// ============================================================================

/// Report about an inbound payload that could not be delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// The payload was dropped because it is not a valid frame.
    MalformedFrame {
        /// Why decoding or classification failed.
        error: String,
        /// The payload, lossily decoded as UTF-8.
        payload: String,
    },
}

// ============================================================================
// Classification
// ============================================================================

/// Turns one frame into the events it publishes, in publishing order.
///
/// `raw` is the undecoded payload, quoted by the legacy fallback.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`](crate::Error::MalformedFrame) for a
/// `LOGGER` frame whose timestamp cannot be read.
pub fn classify(frame: &Frame, raw: &str) -> Result<Vec<Event>> {
    let events = match frame.stream_type.route() {
        Route::Log => {
            let line = format_log_line(&frame.data)?;
            vec![Event::logger(line, frame.task_id())]
        }
        Route::Passthrough => vec![republish(frame)],
        Route::Intent => {
            debug!(stream_type = %frame.stream_type, "Ignoring intent frame from server");
            Vec::new()
        }
        Route::Legacy => {
            let mut events = legacy::classify(frame, raw);
            events.push(republish(frame));
            events
        }
    };
    Ok(events)
}

/// The frame itself as an event, scoped by `data.taskId`.
#[inline]
fn republish(frame: &Frame) -> Event {
    Event::new(frame.stream_type.clone(), frame.task_id(), frame.data.clone())
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Classifies inbound payloads and publishes the resulting events.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    bus: EventBus,
    diagnostics: broadcast::Sender<Diagnostic>,
    raw: broadcast::Sender<Arc<[u8]>>,
}

impl Dispatcher {
    /// Creates a dispatcher publishing on `bus`.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        let (diagnostics, _) = broadcast::channel(SIDE_CHANNEL_CAPACITY);
        let (raw, _) = broadcast::channel(SIDE_CHANNEL_CAPACITY);
        Self {
            bus,
            diagnostics,
            raw,
        }
    }

    /// Handles one inbound payload.
    ///
    /// Returns the number of events published. Malformed payloads publish
    /// nothing and are reported on the diagnostics channel.
    pub fn dispatch(&self, bytes: &[u8]) -> usize {
        if self.raw.receiver_count() > 0 {
            let _ = self.raw.send(Arc::from(bytes));
        }

        let raw = String::from_utf8_lossy(bytes);
        let events = match Frame::decode(bytes).and_then(|frame| classify(&frame, &raw)) {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, payload = %raw, "Dropping malformed frame");
                let _ = self.diagnostics.send(Diagnostic::MalformedFrame {
                    error: e.to_string(),
                    payload: raw.into_owned(),
                });
                return 0;
            }
        };

        let count = events.len();
        for event in events {
            self.bus.publish(event);
        }
        count
    }

    /// Returns the event bus.
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribes to diagnostics about dropped payloads.
    #[must_use]
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// Subscribes to every inbound payload, before decoding.
    #[must_use]
    pub fn raw_frames(&self) -> broadcast::Receiver<Arc<[u8]>> {
        self.raw.subscribe()
    }
}

// ============================================================================
// Tests
// ============================================================================
