//! Builder pattern for session configuration.
//!
//! Provides a fluent API for configuring and creating [`Session`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use cbot_stream::Session;
//!
//! # fn example() -> cbot_stream::Result<()> {
//! let session = Session::builder()
//!     .host("bot.local")
//!     .port(2269)
//!     .reconnect_delay(Duration::from_secs(2))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use url::Url;

use crate::dispatch::DEFAULT_EVENT_CAPACITY;
use crate::error::{Error, Result};
use crate::network::{ConnectivityProbe, NetworkMonitor, ProbeHandle};

use super::core::Session;
use super::options::{
    DEFAULT_HOST, DEFAULT_PORT, DEFAULT_RECONNECT_DELAY, STREAM_PATH, SessionOptions,
};

// ============================================================================
// SessionBuilder
// ============================================================================

/// Builder for configuring a [`Session`].
///
/// Use [`Session::builder()`] to create a new builder. Without any settings it
/// targets `ws://localhost:2269/stream`.
#[derive(Clone)]
pub struct SessionBuilder {
    /// Full endpoint URL; overrides host/port/base path/secure.
    endpoint: Option<String>,
    /// Server host.
    host: String,
    /// Server port.
    port: u16,
    /// Path the stream endpoint is mounted under.
    base_path: String,
    /// Use `wss` instead of `ws`.
    secure: bool,
    /// Delay before reconnecting.
    reconnect_delay: Duration,
    /// Per-subscriber event buffer.
    event_capacity: usize,
    /// Shared availability monitor.
    network: Option<NetworkMonitor>,
    /// Probe and polling interval.
    probe: Option<(Arc<dyn ConnectivityProbe>, Duration)>,
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self {
            endpoint: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            base_path: "/".to_string(),
            secure: false,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            network: None,
            probe: None,
        }
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("endpoint", &self.endpoint)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_path", &self.base_path)
            .field("secure", &self.secure)
            .field("reconnect_delay", &self.reconnect_delay)
            .field("event_capacity", &self.event_capacity)
            .field("probe", &self.probe.as_ref().map(|(_, interval)| interval))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SessionBuilder Implementation
// ============================================================================

impl SessionBuilder {
    /// Creates a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the full endpoint URL.
    ///
    /// Takes precedence over [`host`](Self::host), [`port`](Self::port),
    /// [`base_path`](Self::base_path) and [`secure`](Self::secure).
    ///
    /// # Arguments
    ///
    /// * `url` - WebSocket URL (e.g., "ws://10.0.0.5:2269/stream")
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the server host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the server port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the path the stream endpoint lives under.
    ///
    /// `"/bot"` yields `.../bot/stream`.
    #[inline]
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Selects `wss://` instead of `ws://`.
    #[inline]
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the delay between an abnormal closure and the reconnect.
    #[inline]
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Sets how many events each subscriber buffers before lagging.
    #[inline]
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Shares an existing availability monitor with the session.
    #[inline]
    #[must_use]
    pub fn network(mut self, network: NetworkMonitor) -> Self {
        self.network = Some(network);
        self
    }

    /// Polls `probe` every `interval` for the lifetime of the session.
    ///
    /// # Arguments
    ///
    /// * `probe` - Connectivity source feeding the network monitor
    /// * `interval` - Polling period (must be non-zero)
    #[inline]
    #[must_use]
    pub fn probe<P>(mut self, probe: P, interval: Duration) -> Self
    where
        P: ConnectivityProbe + 'static,
    {
        let probe: Arc<dyn ConnectivityProbe> = Arc::new(probe);
        self.probe = Some((probe, interval));
        self
    }

    /// Builds the session with validation.
    ///
    /// The session starts [`Idle`](super::SessionState::Idle); call
    /// [`Session::enable`] to connect.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEndpoint`] if the endpoint does not parse
    /// - [`Error::Config`] if the scheme is not `ws`/`wss`, the event capacity
    ///   is zero, or a probe is configured outside a tokio runtime
    pub fn build(self) -> Result<Session> {
        let options = self.validate()?;
        let network = self.network.unwrap_or_default();

        let probe = match self.probe {
            Some((probe, interval)) => Some(start_probe(&network, probe, interval)?),
            None => None,
        };

        Ok(Session::new(options, network, probe))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl SessionBuilder {
    /// Resolves and validates the options.
    fn validate(&self) -> Result<SessionOptions> {
        if self.event_capacity == 0 {
            return Err(Error::config("Event capacity must be at least 1"));
        }

        let endpoint = self.resolve_endpoint()?;

        Ok(SessionOptions {
            reconnect_delay: self.reconnect_delay,
            event_capacity: self.event_capacity,
            ..SessionOptions::new(endpoint)
        })
    }

    /// Parses the endpoint, or assembles it from host and port.
    fn resolve_endpoint(&self) -> Result<Url> {
        let url = match &self.endpoint {
            Some(endpoint) => Url::parse(endpoint)?,
            None => {
                let scheme = if self.secure { "wss" } else { "ws" };
                let base = self.base_path.trim_matches('/');
                let path = if base.is_empty() {
                    format!("/{STREAM_PATH}")
                } else {
                    format!("/{base}/{STREAM_PATH}")
                };
                Url::parse(&format!("{scheme}://{}:{}{path}", self.host, self.port))?
            }
        };

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Endpoint must use ws:// or wss://, got: {url}"
            )));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::config(format!("Endpoint has no host: {url}")));
        }

        Ok(url)
    }
}

/// Starts the probe task on the current runtime.
fn start_probe(
    network: &NetworkMonitor,
    probe: Arc<dyn ConnectivityProbe>,
    interval: Duration,
) -> Result<ProbeHandle> {
    if interval.is_zero() {
        return Err(Error::config("Probe interval must be non-zero"));
    }

    Handle::try_current().map_err(|_| {
        Error::config("A connectivity probe needs a running tokio runtime to build the session")
    })?;

    Ok(network.spawn_probe(probe, interval))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    struct Offline;

    #[async_trait]
    impl ConnectivityProbe for Offline {
        async fn check(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_default_endpoint() {
        let options = SessionBuilder::new().validate().expect("valid");
        assert_eq!(options.endpoint.as_str(), "ws://localhost:2269/stream");
        assert_eq!(options.reconnect_delay, DEFAULT_RECONNECT_DELAY);
        assert_eq!(options.event_capacity, DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn test_host_port_base_path_secure() {
        let options = SessionBuilder::new()
            .host("10.0.0.5")
            .port(8443)
            .base_path("/bot/")
            .secure(true)
            .validate()
            .expect("valid");
        assert_eq!(options.endpoint.as_str(), "wss://10.0.0.5:8443/bot/stream");
    }

    #[test]
    fn test_endpoint_overrides_parts() {
        let options = SessionBuilder::new()
            .host("ignored")
            .endpoint("ws://example.com:9000/custom")
            .validate()
            .expect("valid");
        assert_eq!(options.endpoint.as_str(), "ws://example.com:9000/custom");
    }

    #[test]
    fn test_rejects_http_scheme() {
        let err = SessionBuilder::new()
            .endpoint("http://localhost:2269/stream")
            .validate()
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("ws://"));
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let err = SessionBuilder::new().endpoint("not a url").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidEndpoint(_)));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = SessionBuilder::new().event_capacity(0).validate().unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_probe_requires_runtime() {
        let err = SessionBuilder::new()
            .probe(Offline, Duration::from_secs(1))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("runtime"));
    }

    #[tokio::test]
    async fn test_probe_rejects_zero_interval() {
        let err = SessionBuilder::new()
            .probe(Offline, Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("interval"));
    }

    #[tokio::test]
    async fn test_probe_feeds_shared_monitor() {
        let network = NetworkMonitor::new(true);
        let mut changes = network.subscribe();

        let session = SessionBuilder::new()
            .network(network.clone())
            .probe(Offline, Duration::from_millis(10))
            .build()
            .expect("session");

        tokio::time::timeout(Duration::from_secs(2), changes.changed())
            .await
            .expect("probe ran")
            .expect("monitor alive");
        assert!(!session.is_online());
        assert!(!network.is_online());
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = SessionBuilder::new().port(1234);
        let cloned = builder.clone();
        assert_eq!(builder.port, cloned.port);
        assert!(format!("{cloned:?}").contains("1234"));
    }
}
