//! Stream session.
//!
//! This module provides the main entry point: a [`Session`] holding one
//! persistent WebSocket to the bot's stream endpoint.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Session`] | Connection lifecycle, reconnect policy, send and subscribe |
//! | [`SessionBuilder`] | Fluent configuration builder |
//! | [`SessionOptions`] | Validated configuration |
//! | [`SessionState`] | Lifecycle state |
//! | [`TaskCommands`] | Task management shorthands |
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cbot_stream::{Result, Session, TaskId};
//!
//! # async fn example() -> Result<()> {
//! let session = Session::builder().host("bot.local").build()?;
//!
//! session.enable(|| tracing::info!("stream ready"))?;
//! session.wait_open(Duration::from_secs(10)).await?;
//!
//! session.tasks().list()?;
//! session.tasks().info(TaskId::new(4))?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for session configuration.
pub mod builder;

/// Core session implementation.
pub mod core;

/// Validated session options and defaults.
pub mod options;

/// Lifecycle states.
pub mod state;

/// Task management commands.
pub mod tasks;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::SessionBuilder;
pub use core::Session;
pub use options::{DEFAULT_PORT, DEFAULT_RECONNECT_DELAY, SessionOptions};
pub use state::SessionState;
pub use tasks::TaskCommands;
