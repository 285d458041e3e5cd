//! Legacy payload classification.
//!
//! Older server commands answer with loosely typed payloads instead of a
//! dedicated stream type. These heuristics turn them into `LOGGER` events so
//! subscribers see one event shape.
//!
//! # Priority
//!
//! | Order | Payload | Result |
//! |-------|---------|--------|
//! | 1 | `output` is a non-empty string | one log line |
//! | 2 | `output` is a list | one log line per element |
//! | 3 | `data` is a list and `cmd != "ps"` | one log line per entry |
//! | 4 | no `resp_code` key | `"Unknown: <raw payload>"` |
//!
//! Only the first matching rule applies.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};
use crate::identifiers::TaskId;
use crate::protocol::{Event, Frame};

// ============================================================================
// Constants
// ============================================================================

/// Prefix of the fallback line for payloads nothing else recognises.
pub const UNKNOWN_PREFIX: &str = "Unknown: ";

/// Command whose `data` list is a process table, not log entries.
const PROCESS_LIST_CMD: &str = "ps";

/// Leading integer of a timestamp string, fraction ignored.
static LEADING_INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)").expect("valid timestamp pattern"));

// ============================================================================
// Log Line Formatting
// ============================================================================

/// Reads whole epoch seconds out of a `ts` value.
///
/// Numbers are truncated toward zero; strings contribute their leading
/// integer (`"1700000000.123"` → `1700000000`).
#[must_use]
pub fn epoch_seconds(ts: &Value) -> Option<i64> {
    match ts {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => LEADING_INTEGER
            .captures(s)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        _ => None,
    }
}

/// Formats epoch seconds as an ISO-8601 UTC timestamp with milliseconds.
///
/// `1700000000` → `2023-11-14T22:13:20.000Z`.
#[must_use]
pub fn iso_timestamp(seconds: i64) -> Option<String> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Formats a `{ts, taskId, msg}` entry as `"<timestamp> <taskId> - <msg>"`.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] if the entry is not an object or its
/// `ts` is missing, unparseable or out of range.
pub fn format_log_line(entry: &Value) -> Result<String> {
    let fields = entry
        .as_object()
        .ok_or_else(|| Error::malformed_frame("log entry is not an object"))?;

    let ts = fields
        .get("ts")
        .ok_or_else(|| Error::malformed_frame("log entry has no `ts`"))?;
    let timestamp = epoch_seconds(ts)
        .and_then(iso_timestamp)
        .ok_or_else(|| Error::malformed_frame(format!("invalid log timestamp: {ts}")))?;

    let task_id = render_task_id(fields.get("taskId"));
    let msg = render_text(fields.get("msg"));

    Ok(format!("{timestamp} {task_id} - {msg}"))
}

/// Renders `taskId` the way it appears in a log line.
fn render_task_id(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => TaskId::UNSCOPED.to_string(),
        Some(Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
            _ => n.to_string(),
        },
        Some(other) => render_text(Some(other)),
    }
}

/// Renders a value as plain text: strings unquoted, null empty, rest as JSON.
fn render_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Classifies a frame of unrecognised type into `LOGGER` events.
///
/// `raw` is the undecoded payload, quoted verbatim by the fallback rule.
/// The caller republishes the frame itself afterwards.
#[must_use]
pub fn classify(frame: &Frame, raw: &str) -> Vec<Event> {
    let Some(fields) = frame.fields() else {
        return vec![unknown(raw)];
    };

    match fields.get("output") {
        Some(Value::String(line)) if !line.is_empty() => {
            return vec![Event::logger(line.as_str(), TaskId::UNSCOPED)];
        }
        Some(Value::Array(lines)) => {
            return lines
                .iter()
                .map(|line| Event::logger(line.clone(), TaskId::UNSCOPED))
                .collect();
        }
        _ => {}
    }

    if let Some(Value::Array(entries)) = fields.get("data")
        && fields.get("cmd").and_then(Value::as_str) != Some(PROCESS_LIST_CMD)
    {
        return entries.iter().filter_map(log_entry).collect();
    }

    if fields.contains_key("resp_code") {
        Vec::new()
    } else {
        vec![unknown(raw)]
    }
}

/// Converts one element of a legacy `data` list.
fn log_entry(entry: &Value) -> Option<Event> {
    if let Value::String(line) = entry {
        return Some(Event::logger(line.as_str(), TaskId::UNSCOPED));
    }

    match format_log_line(entry) {
        Ok(line) => Some(Event::logger(line, TaskId::UNSCOPED)),
        Err(e) => {
            warn!(error = %e, "Skipping legacy log entry");
            None
        }
    }
}

/// Fallback line for unclassifiable payloads.
#[inline]
fn unknown(raw: &str) -> Event {
    Event::logger(format!("{UNKNOWN_PREFIX}{raw}"), TaskId::UNSCOPED)
}

// ============================================================================
// Tests
// ============================================================================
