//! Task intents.
//!
//! Cloning or modifying a task is requested by one local collaborator and
//! handled by another. Those requests travel on their own channel, separate
//! from the event bus, so an event subscriber that reacts to an intent can
//! never feed the dispatcher and loop.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::protocol::StreamType;

// ============================================================================
// Constants
// ============================================================================

/// Number of intents buffered per subscriber.
const INTENT_CAPACITY: usize = 64;

// ============================================================================
// TaskIntent
// ============================================================================

/// A local request concerning a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskIntent {
    /// Open a task creation form prefilled from this task.
    Clone(Value),
    /// Open a modification form for this task.
    Modify(Value),
}

impl TaskIntent {
    /// Returns the stream type this intent corresponds to.
    #[must_use]
    pub fn stream_type(&self) -> StreamType {
        match self {
            Self::Clone(_) => StreamType::CloneTask,
            Self::Modify(_) => StreamType::ModifyTask,
        }
    }

    /// Returns the task payload.
    #[inline]
    #[must_use]
    pub fn task(&self) -> &Value {
        match self {
            Self::Clone(task) | Self::Modify(task) => task,
        }
    }
}

// ============================================================================
// IntentBus
// ============================================================================

/// Channel carrying [`TaskIntent`]s between collaborators.
#[derive(Debug, Clone)]
pub struct IntentBus {
    sender: broadcast::Sender<TaskIntent>,
}

impl IntentBus {
    /// Creates an intent bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(INTENT_CAPACITY);
        Self { sender }
    }

    /// Emits an intent to every current listener.
    pub fn emit(&self, intent: TaskIntent) -> usize {
        let stream_type = intent.stream_type();
        let receivers = self.sender.send(intent).unwrap_or_default();
        debug!(%stream_type, receivers, "Task intent emitted");
        receivers
    }

    /// Starts listening for intents.
    #[must_use]
    pub fn listen(&self) -> IntentListener {
        IntentListener {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for IntentBus {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// IntentListener
// ============================================================================

/// Receiving end of an [`IntentBus`].
#[derive(Debug)]
pub struct IntentListener {
    receiver: broadcast::Receiver<TaskIntent>,
}

impl IntentListener {
    /// Receives the next intent, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<TaskIntent> {
        loop {
            match self.receiver.recv().await {
                Ok(intent) => return Some(intent),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Intent listener lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn test_intent_delivery() {
        let bus = IntentBus::new();
        let mut listener = bus.listen();

        assert_eq!(bus.emit(TaskIntent::Clone(json!({ "id": 3 }))), 1);

        let intent = listener.recv().await.expect("intent");
        assert_eq!(intent.stream_type(), StreamType::CloneTask);
        assert_eq!(intent.task()["id"], json!(3));
    }

    #[test]
    fn test_modify_stream_type() {
        let intent = TaskIntent::Modify(json!({}));
        assert_eq!(intent.stream_type(), StreamType::ModifyTask);
    }

    #[test]
    fn test_emit_without_listeners() {
        let bus = IntentBus::default();
        assert_eq!(bus.emit(TaskIntent::Modify(json!(null))), 0);
    }
}
