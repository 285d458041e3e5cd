//! Event dispatch.
//!
//! Turns the session's inbound byte stream into typed events and fans them
//! out to any number of subscribers.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `bus` | Publish/subscribe fan-out |
//! | `dispatcher` | Classify-and-publish per frame |
//! | `intent` | Clone/modify task intents, kept off the event bus |
//! | `legacy` | Heuristics for loosely typed payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Publish/subscribe fan-out.
pub mod bus;

/// Classify-and-publish per frame.
pub mod dispatcher;

/// Task intents.
pub mod intent;

/// Legacy payload classification.
pub mod legacy;

// ============================================================================
// Re-exports
// ============================================================================

pub use bus::{DEFAULT_EVENT_CAPACITY, EventBus, Subscription};
pub use dispatcher::{Diagnostic, Dispatcher, classify};
pub use intent::{IntentBus, IntentListener, TaskIntent};
