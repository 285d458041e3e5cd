//! WebSocket transport layer.
//!
//! This module handles the physical socket between the local session and
//! the stream server.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Session        │                              │  Stream server  │
//! │                 │         WebSocket            │                 │
//! │  Connection ────┼─────────────────────────────►│  /stream        │
//! │  (one at a time)│◄─────────────────────────────┼  {stream, data} │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `Connection::open` - Spawn the connection task, start the handshake
//! 2. `ConnectionHandler::on_open` - Handshake done, frames may be sent
//! 3. `ConnectionHandler::on_message` - One call per inbound payload
//! 4. `Connection::close` - Closing handshake with a close code
//! 5. `ConnectionHandler::on_close` - Final close code, task ends
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// Local WebSocket server for tests.
#[cfg(test)]
pub(crate) mod test_server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Closure, Connection, ConnectionHandler};
