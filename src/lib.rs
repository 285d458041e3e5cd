//! cbot-stream - Persistent stream client for the cbot trading bot.
//!
//! This library keeps a client attached to the bot's `/stream` WebSocket
//! endpoint, turns the server's heterogeneous JSON frames into typed events,
//! and sends commands back.
//!
//! # Architecture
//!
//! The client is a single long-lived session:
//!
//! - **Session**: Owns one socket, reconnects after abnormal closures while
//!   the network is up
//! - **Dispatcher**: Classifies each inbound frame (log line, passthrough,
//!   legacy command output) and publishes the results
//! - **Event bus**: Broadcast fan-out to any number of subscribers
//!
//! Key design principles:
//!
//! - At most one live socket per [`Session`]; stale socket callbacks are
//!   discarded by [`ConnectionId`]
//! - Sending never waits on the network
//! - A malformed frame never takes the session down
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cbot_stream::{Result, Session, StreamType};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = Session::builder()
//!         .host("localhost")
//!         .port(2269)
//!         .build()?;
//!
//!     let mut events = session.subscribe();
//!     session.enable(|| tracing::info!("connected"))?;
//!     session.wait_open(Duration::from_secs(10)).await?;
//!
//!     session.tasks().list()?;
//!
//!     while let Some(event) = events.recv().await {
//!         if event.is(&StreamType::Logger) {
//!             println!("{}", event.text().unwrap_or_default());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`], [`SessionBuilder`], task commands |
//! | [`dispatch`] | Frame classification, [`EventBus`], intents |
//! | [`network`] | [`NetworkMonitor`] and connectivity probes |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | [`TaskId`] and [`ConnectionId`] |
//! | [`protocol`] | Wire types: commands, frames, events |
//! | [`transport`] | WebSocket connection (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Frame classification and event fan-out.
///
/// - [`Dispatcher`] - Decodes and classifies inbound payloads
/// - [`EventBus`] - Broadcast channel for events
/// - [`IntentBus`] - Local clone/modify task requests
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Network availability signal.
pub mod network;

/// Wire protocol types.
///
/// Commands sent to the server, frames received from it, and the events
/// derived from those frames.
pub mod protocol;

/// Stream session and configuration.
///
/// Use [`Session::builder()`] to create a configured session.
pub mod session;

/// WebSocket transport layer.
///
/// Internal module owning the socket task.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Dispatch types
pub use dispatch::{
    Diagnostic, Dispatcher, EventBus, IntentBus, IntentListener, Subscription, TaskIntent,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, TaskId};

// Network types
pub use network::{ConnectivityProbe, NetworkMonitor, ProbeHandle, TcpProbe};

// Protocol types
pub use protocol::{CommandRequest, Event, Frame, StreamType};

// Session types
pub use session::{Session, SessionBuilder, SessionOptions, SessionState, TaskCommands};
