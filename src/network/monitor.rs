//! Network availability state.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use super::probe::{ConnectivityProbe, ProbeHandle};

// ============================================================================
// NetworkMonitor
// ============================================================================

/// Shared view of whether the host can reach the network.
///
/// Cloning yields another handle to the same state. The session reads it
/// before scheduling a reconnect; platform code (or a
/// [`ConnectivityProbe`]) writes it.
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    state: Arc<watch::Sender<bool>>,
}

impl NetworkMonitor {
    /// Creates a monitor with the given initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        Self {
            state: Arc::new(state),
        }
    }

    /// Returns `true` if the network is currently reported available.
    #[inline]
    #[must_use]
    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Records a connectivity change.
    ///
    /// Subscribers are only notified when the value actually changes.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });

        if changed {
            info!(online, "Network availability changed");
        }
    }

    /// Subscribes to availability changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Starts polling `probe` every `interval`, feeding the result back.
    ///
    /// Polling stops when the returned handle is dropped.
    pub fn spawn_probe<P>(&self, probe: P, interval: Duration) -> ProbeHandle
    where
        P: ConnectivityProbe + 'static,
    {
        ProbeHandle::spawn(self.clone(), probe, interval)
    }
}

impl Default for NetworkMonitor {
    /// Starts online, like a host that has not reported otherwise.
    fn default() -> Self {
        Self::new(true)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_online() {
        assert!(NetworkMonitor::default().is_online());
    }

    #[test]
    fn test_clones_share_state() {
        let monitor = NetworkMonitor::new(true);
        let other = monitor.clone();

        other.set_online(false);
        assert!(!monitor.is_online());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_online(true);
        assert!(!rx.has_changed().expect("sender alive"));

        monitor.set_online(false);
        rx.changed().await.expect("change");
        assert!(!*rx.borrow_and_update());
    }
}
