//! Task management commands.
//!
//! Thin wrappers over [`Session::send`] for the commands the bot's task
//! manager understands.
//!
//! | Method | Wire form |
//! |--------|-----------|
//! | [`info`](TaskCommands::info) | `{"cmd":"info","args":["<id>"],"kwargs":{}}` |
//! | [`info_all`](TaskCommands::info_all) | `{"cmd":"info","args":[],"kwargs":{}}` |
//! | [`output`](TaskCommands::output) | `{"raw_input":"get <id>"}` |
//! | [`tail`](TaskCommands::tail) | `{"cmd":"get","args":["-1","<lines>"],"kwargs":{}}` |
//! | [`pause`](TaskCommands::pause) | `{"cmd":"pause","args":["<id>"],"kwargs":{}}` |
//! | [`kill`](TaskCommands::kill) | `{"cmd":"kill","args":["<id>"],"kwargs":{}}` |
//! | [`clean`](TaskCommands::clean) | `{"cmd":"clean","args":[],"kwargs":{}}` |
//! | [`list`](TaskCommands::list) | `{"cmd":"ps","args":[],"kwargs":{}}` |
//! | [`stats`](TaskCommands::stats) | `{"cmd":"stats","args":[],"kwargs":{}}` |
//!
//! Replies arrive as `RESULT` frames on the event bus.

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::identifiers::TaskId;
use crate::protocol::CommandRequest;

use super::core::Session;

// ============================================================================
// TaskCommands
// ============================================================================

/// Task commands bound to a session.
///
/// Obtained from [`Session::tasks`]. Every method fails with
/// [`Error::NotConnected`](crate::Error::NotConnected) unless the session is
/// open.
#[derive(Debug, Clone, Copy)]
pub struct TaskCommands<'a> {
    session: &'a Session,
}

impl<'a> TaskCommands<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Requests details for one task.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn info(&self, id: TaskId) -> Result<()> {
        self.session.send(CommandRequest::cmd("info").arg(id.to_string()))
    }

    /// Requests details for every task.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn info_all(&self) -> Result<()> {
        self.session.send(CommandRequest::cmd("info"))
    }

    /// Requests the buffered output of a task.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn output(&self, id: TaskId) -> Result<()> {
        self.session.send(CommandRequest::raw(format!("get {id}")))
    }

    /// Requests the last `lines` output lines of every task.
    ///
    /// Replies arrive as a `RESULT` frame for `get` with one entry per task.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn tail(&self, lines: u32) -> Result<()> {
        self.session
            .send(CommandRequest::cmd("get").arg("-1").arg(lines.to_string()))
    }

    /// Pauses a task.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn pause(&self, id: TaskId) -> Result<()> {
        self.session.send(CommandRequest::cmd("pause").arg(id.to_string()))
    }

    /// Stops a task.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn kill(&self, id: TaskId) -> Result<()> {
        self.session.send(CommandRequest::cmd("kill").arg(id.to_string()))
    }

    /// Removes finished tasks.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn clean(&self) -> Result<()> {
        self.session.send(CommandRequest::cmd("clean"))
    }

    /// Lists running tasks.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn list(&self) -> Result<()> {
        self.session.send(CommandRequest::cmd("ps"))
    }

    /// Requests aggregate statistics.
    ///
    /// # Errors
    ///
    /// See [`Session::send`].
    pub fn stats(&self) -> Result<()> {
        self.session.send(CommandRequest::cmd("stats"))
    }
}

// ============================================================================
// Tests
// ============================================================================
