//! Wire protocol message types.
//!
//! This module defines the JSON messages exchanged with the stream server
//! over a message-oriented socket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `CommandRequest` | Local → Remote | Structured or raw command |
//! | `Frame` | Remote → Local | `{stream, data}` envelope |
//! | `Event` | Local bus | Classified frame for subscribers |
//!
//! # Close Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | `1000` | Normal closure, never followed by a reconnect |
//! | anything else | Abnormal closure, reconnect if online |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound command requests |
//! | `event` | Stream types and bus events |
//! | `frame` | Inbound envelope decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command requests.
pub mod command;

/// Stream types and bus events.
pub mod event;

/// Inbound frame envelope.
pub mod frame;

// ============================================================================
// Constants
// ============================================================================

/// Close code for an intentional, normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close code reported when the socket died without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::CommandRequest;
pub use event::{Event, Route, StreamType};
pub use frame::Frame;
