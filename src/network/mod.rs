//! Network availability.
//!
//! The session only attempts automatic reconnects while the host reports
//! outbound connectivity. This module holds that signal.
//!
//! # Lifecycle
//!
//! 1. `NetworkMonitor::new` - Create the shared state (or take the default, online)
//! 2. `NetworkMonitor::spawn_probe` - Optionally poll a [`ConnectivityProbe`]
//! 3. `ProbeHandle` drop - Stop polling
//!
//! Platform integrations that already receive online/offline notifications
//! call [`NetworkMonitor::set_online`] directly instead of probing.

// ============================================================================
// Submodules
// ============================================================================

/// Shared availability state.
pub mod monitor;

/// Connectivity probes.
pub mod probe;

// ============================================================================
// Re-exports
// ============================================================================

pub use monitor::NetworkMonitor;
pub use probe::{ConnectivityProbe, ProbeHandle, TcpProbe};
