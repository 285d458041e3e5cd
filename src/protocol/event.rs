//! Stream types and bus events.
//!
//! Every inbound frame is tagged with a stream type. The set of stream types
//! is open: names the server adds later arrive as [`StreamType::Other`] and are
//! still delivered.
//!
//! # Stream Types
//!
//! | Route | Types |
//! |-------|-------|
//! | Log | `LOGGER` |
//! | Passthrough | `BIN_LIVE_UPDATE`, `CMC_LATEST_UPDATE`, `CRYPTO_STATS`, `CRYPTO_TSL_UPDATE`, `STREAM_TICKERS`, `TASK_FINISHED`, `TASK_INFO`, `TASK_MANAGER`, `TASK_MODIFIED`, `TICKER_UPDATE` |
//! | Intent | `CLONE_TASK`, `MODIFY_TASK` |
//! | Legacy | `RESULT`, anything unknown |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::identifiers::TaskId;

// ============================================================================
// StreamType
// ============================================================================

/// Category of a frame or event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// Live order-book updates.
    BinLiveUpdate,
    /// Request to clone a task (local intent).
    CloneTask,
    /// Latest market-cap listing.
    CmcLatestUpdate,
    /// Aggregated crypto statistics.
    CryptoStats,
    /// Trailing stop-loss updates.
    CryptoTslUpdate,
    /// Log line.
    Logger,
    /// Request to modify a task (local intent).
    ModifyTask,
    /// Response to a command.
    Result,
    /// Ticker stream snapshot.
    StreamTickers,
    /// A task finished.
    TaskFinished,
    /// Task details.
    TaskInfo,
    /// Task list changes.
    TaskManager,
    /// A task was modified.
    TaskModified,
    /// Single ticker update.
    TickerUpdate,
    /// Stream type this client does not know.
    Other(String),
}

/// How the dispatcher treats a stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Formatted into a log line.
    Log,
    /// Republished verbatim.
    Passthrough,
    /// Never published from the wire; local intents only.
    Intent,
    /// Legacy classification, then republished verbatim.
    Legacy,
}

impl StreamType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::BinLiveUpdate => "BIN_LIVE_UPDATE",
            Self::CloneTask => "CLONE_TASK",
            Self::CmcLatestUpdate => "CMC_LATEST_UPDATE",
            Self::CryptoStats => "CRYPTO_STATS",
            Self::CryptoTslUpdate => "CRYPTO_TSL_UPDATE",
            Self::Logger => "LOGGER",
            Self::ModifyTask => "MODIFY_TASK",
            Self::Result => "RESULT",
            Self::StreamTickers => "STREAM_TICKERS",
            Self::TaskFinished => "TASK_FINISHED",
            Self::TaskInfo => "TASK_INFO",
            Self::TaskManager => "TASK_MANAGER",
            Self::TaskModified => "TASK_MODIFIED",
            Self::TickerUpdate => "TICKER_UPDATE",
            Self::Other(name) => name,
        }
    }

    /// Returns how the dispatcher handles frames of this type.
    #[must_use]
    pub fn route(&self) -> Route {
        match self {
            Self::Logger => Route::Log,
            Self::BinLiveUpdate
            | Self::CmcLatestUpdate
            | Self::CryptoStats
            | Self::CryptoTslUpdate
            | Self::StreamTickers
            | Self::TaskFinished
            | Self::TaskInfo
            | Self::TaskManager
            | Self::TaskModified
            | Self::TickerUpdate => Route::Passthrough,
            Self::CloneTask | Self::ModifyTask => Route::Intent,
            Self::Result | Self::Other(_) => Route::Legacy,
        }
    }

    /// Returns `true` for stream types this client knows by name.
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for StreamType {
    fn from(name: &str) -> Self {
        match name {
            "BIN_LIVE_UPDATE" => Self::BinLiveUpdate,
            "CLONE_TASK" => Self::CloneTask,
            "CMC_LATEST_UPDATE" => Self::CmcLatestUpdate,
            "CRYPTO_STATS" => Self::CryptoStats,
            "CRYPTO_TSL_UPDATE" => Self::CryptoTslUpdate,
            "LOGGER" => Self::Logger,
            "MODIFY_TASK" => Self::ModifyTask,
            "RESULT" => Self::Result,
            "STREAM_TICKERS" => Self::StreamTickers,
            "TASK_FINISHED" => Self::TaskFinished,
            "TASK_INFO" => Self::TaskInfo,
            "TASK_MANAGER" => Self::TaskManager,
            "TASK_MODIFIED" => Self::TaskModified,
            "TICKER_UPDATE" => Self::TickerUpdate,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for StreamType {
    fn from(name: String) -> Self {
        match Self::from(name.as_str()) {
            Self::Other(_) => Self::Other(name),
            known => known,
        }
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StreamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StreamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

// ============================================================================
// Event
// ============================================================================

/// A classified message published on the event bus.
///
/// Events are immutable; each subscriber receives its own clone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Event category.
    #[serde(rename = "type")]
    pub stream_type: StreamType,

    /// Task the event belongs to (`0` = unscoped).
    #[serde(rename = "taskId")]
    pub task_id: TaskId,

    /// Event payload. A string for `LOGGER` events built by the classifier.
    pub data: Value,
}

impl Event {
    /// Creates an event.
    #[inline]
    #[must_use]
    pub fn new(stream_type: StreamType, task_id: TaskId, data: Value) -> Self {
        Self {
            stream_type,
            task_id,
            data,
        }
    }

    /// Creates a `LOGGER` event carrying a log line.
    #[inline]
    #[must_use]
    pub fn logger(line: impl Into<Value>, task_id: TaskId) -> Self {
        Self::new(StreamType::Logger, task_id, line.into())
    }

    /// Returns `true` if the event has the given type.
    #[inline]
    #[must_use]
    pub fn is(&self, stream_type: &StreamType) -> bool {
        &self.stream_type == stream_type
    }

    /// Returns the payload as text, if it is a string.
    #[inline]
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.data.as_str()
    }

    /// Gets a string field from an object payload.
    #[inline]
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
