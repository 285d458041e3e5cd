//! Connectivity probes.
//!
//! A probe answers "can we reach the network right now?". The monitor polls
//! it on an interval in a background task owned by a [`ProbeHandle`].

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, trace};

use super::NetworkMonitor;

// ============================================================================
// Constants
// ============================================================================

/// How long a TCP probe waits for the handshake.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

// ============================================================================
// ConnectivityProbe
// ============================================================================

/// Source of connectivity signals.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Returns `true` if the network is reachable.
    async fn check(&self) -> bool;
}

#[async_trait]
impl<P: ConnectivityProbe + ?Sized> ConnectivityProbe for Arc<P> {
    async fn check(&self) -> bool {
        (**self).check().await
    }
}

// ============================================================================
// TcpProbe
// ============================================================================

/// Reports online when a TCP handshake with `target` succeeds.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    target: String,
    connect_timeout: Duration,
}

impl TcpProbe {
    /// Creates a probe for `target` (`host:port`).
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            connect_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Sets the handshake timeout.
    #[must_use]
    pub fn with_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Returns the probed address.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn check(&self) -> bool {
        match timeout(self.connect_timeout, TcpStream::connect(&self.target)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                trace!(target = %self.target, error = %e, "Probe connect failed");
                false
            }
            Err(_) => {
                trace!(target = %self.target, "Probe timed out");
                false
            }
        }
    }
}

// ============================================================================
// ProbeHandle
// ============================================================================

/// Owner of a running probe task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct ProbeHandle {
    task: JoinHandle<()>,
}

impl ProbeHandle {
    /// Spawns the polling task.
    pub(crate) fn spawn<P>(monitor: NetworkMonitor, probe: P, period: Duration) -> Self
    where
        P: ConnectivityProbe + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                monitor.set_online(probe.check().await);
            }
        });

        debug!(?period, "Connectivity probe started");
        Self { task }
    }
}

impl Drop for ProbeHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio::net::TcpListener;

    /// Probe whose answer the test controls.
    struct FlagProbe {
        online: Arc<AtomicBool>,
        checks: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConnectivityProbe for FlagProbe {
        async fn check(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            self.online.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_probe_feeds_monitor() {
        let monitor = NetworkMonitor::new(true);
        let mut rx = monitor.subscribe();
        let online = Arc::new(AtomicBool::new(false));
        let checks = Arc::new(AtomicUsize::new(0));

        let _handle = monitor.spawn_probe(
            FlagProbe {
                online: Arc::clone(&online),
                checks: Arc::clone(&checks),
            },
            Duration::from_millis(10),
        );

        timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("change within timeout")
            .expect("sender alive");
        assert!(!monitor.is_online());

        online.store(true, Ordering::SeqCst);
        timeout(Duration::from_secs(2), rx.changed())
            .await
            .expect("change within timeout")
            .expect("sender alive");
        assert!(monitor.is_online());
        assert!(checks.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_drop_stops_probe() {
        let monitor = NetworkMonitor::new(true);
        let checks = Arc::new(AtomicUsize::new(0));

        let handle = monitor.spawn_probe(
            FlagProbe {
                online: Arc::new(AtomicBool::new(true)),
                checks: Arc::clone(&checks),
            },
            Duration::from_millis(5),
        );
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;

        let after_drop = checks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(checks.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_tcp_probe_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");

        let probe = TcpProbe::new(addr.to_string());
        assert!(probe.check().await);
    }

    #[tokio::test]
    async fn test_tcp_probe_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let probe = TcpProbe::new(addr.to_string()).with_timeout(Duration::from_millis(500));
        assert_eq!(probe.target(), addr.to_string());
        assert!(!probe.check().await);
    }
}
