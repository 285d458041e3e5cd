//! Persistent stream session.
//!
//! The [`Session`] keeps one WebSocket open to the stream server, reopens it
//! after abnormal closures while the network is up, and fans inbound frames
//! out to subscribers.
//!
//! # Example
//!
//! ```no_run
//! use cbot_stream::{Session, StreamType};
//!
//! # async fn example() -> cbot_stream::Result<()> {
//! let session = Session::builder().build()?;
//! let mut logs = session.subscribe();
//!
//! session.enable(|| tracing::info!("stream ready"))?;
//!
//! while let Some(event) = logs.recv_type(&StreamType::Logger).await {
//!     println!("{}", event.text().unwrap_or_default());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace};
use url::Url;

use crate::dispatch::{
    Diagnostic, Dispatcher, EventBus, IntentBus, IntentListener, Subscription, TaskIntent,
};
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::network::{NetworkMonitor, ProbeHandle};
use crate::protocol::{CommandRequest, NORMAL_CLOSURE};
use crate::transport::{Closure, Connection, ConnectionHandler};

use super::builder::SessionBuilder;
use super::options::SessionOptions;
use super::state::SessionState;
use super::tasks::TaskCommands;

// ============================================================================
// Types
// ============================================================================

/// Callback run after every successful open.
type ReadyCallback = Arc<dyn Fn() + Send + Sync>;

/// Mutable session state, guarded by one lock.
#[derive(Default)]
struct Slot {
    /// Current lifecycle state.
    state: SessionState,
    /// The one socket, if any.
    connection: Option<Connection>,
    /// Generation of the newest socket.
    generation: ConnectionId,
    /// Set by `disable()`, consumed by the next close.
    intentional_close: bool,
    /// Pending reconnect timer.
    reconnect: Option<JoinHandle<()>>,
    /// Callback bound by the last `enable()`.
    on_ready: Option<ReadyCallback>,
}

impl Slot {
    /// Aborts a pending reconnect timer.
    fn cancel_reconnect(&mut self) {
        if let Some(timer) = self.reconnect.take() {
            timer.abort();
            debug!("Pending reconnect cancelled");
        }
    }
}

/// Internal shared state for the session.
pub(crate) struct SessionInner {
    /// Resolved configuration.
    options: SessionOptions,
    /// Connectivity signal consulted before reconnecting.
    network: NetworkMonitor,
    /// Frame classifier and event bus.
    dispatcher: Dispatcher,
    /// Local task intents.
    intents: IntentBus,
    /// Lifecycle state and socket slot.
    slot: Mutex<Slot>,
    /// State change notifications.
    state_tx: watch::Sender<SessionState>,
    /// Probe task tied to this session.
    _probe: Option<ProbeHandle>,
    /// Back-reference for handing out weak handles.
    this: Weak<SessionInner>,
}

/// Socket callbacks routed to a session that may already be gone.
struct SessionHandler(Weak<SessionInner>);

// ============================================================================
// Session
// ============================================================================

/// Persistent connection to the bot's stream endpoint.
///
/// Cloning yields another handle to the same session. The socket and any
/// pending reconnect are torn down when the last handle is dropped.
///
/// # Reconnect policy
///
/// After a closure the session reconnects once `reconnect_delay` has passed
/// if and only if:
///
/// | Condition | Required |
/// |-----------|----------|
/// | Close code | not 1000 |
/// | Closed by `disable()` | no |
/// | Network monitor | online |
#[derive(Clone)]
pub struct Session {
    /// Shared inner state.
    pub(crate) inner: Arc<SessionInner>,
}

// ============================================================================
// Session - Display
// ============================================================================

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.inner.options.endpoint.as_str())
            .field("state", &self.state())
            .field("online", &self.is_online())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Session - Construction
// ============================================================================

impl Session {
    /// Creates a configuration builder for the session.
    #[inline]
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Creates an idle session from validated options.
    pub(crate) fn new(
        options: SessionOptions,
        network: NetworkMonitor,
        probe: Option<ProbeHandle>,
    ) -> Self {
        let dispatcher = Dispatcher::new(EventBus::new(options.event_capacity));
        let (state_tx, _) = watch::channel(SessionState::Idle);

        let inner = Arc::new_cyclic(|this| SessionInner {
            options,
            network,
            dispatcher,
            intents: IntentBus::new(),
            slot: Mutex::new(Slot::default()),
            state_tx,
            _probe: probe,
            this: this.clone(),
        });

        Self { inner }
    }
}

// ============================================================================
// Session - Lifecycle
// ============================================================================

impl Session {
    /// Opens the socket.
    ///
    /// No-op while connecting or open. Otherwise cancels any pending
    /// reconnect, opens a new socket and moves to `Connecting`. `on_ready`
    /// runs after this open succeeds and again after every reconnect.
    ///
    /// The callback is owned by the session, so a `Session` clone captured
    /// in it keeps the session alive.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when called outside a tokio runtime.
    pub fn enable<F>(&self, on_ready: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Handle::try_current()
            .map_err(|_| Error::config("Session::enable must be called within a tokio runtime"))?;

        let mut slot = self.inner.slot.lock();
        if slot.state.is_active() {
            debug!(state = %slot.state, "Session already active");
            return Ok(());
        }

        slot.cancel_reconnect();
        slot.intentional_close = false;
        slot.on_ready = Some(Arc::new(on_ready));
        self.inner.open_socket(&mut slot);
        Ok(())
    }

    /// Closes the socket with code 1000 and suppresses reconnecting.
    ///
    /// No-op if no socket exists, apart from cancelling a pending
    /// reconnect. Does not wait for the closing handshake.
    pub fn disable(&self) {
        let mut slot = self.inner.slot.lock();
        slot.cancel_reconnect();

        let Some(connection) = slot.connection.as_ref() else {
            debug!(state = %slot.state, "No socket to close");
            return;
        };

        info!(id = %connection.id(), "Disabling session");
        connection.close(NORMAL_CLOSURE, "disabled");
        slot.intentional_close = true;
        self.inner.set_state(&mut slot, SessionState::Closing);
    }

    /// Waits until the session is open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the session does not open within
    /// `wait`.
    pub async fn wait_open(&self, wait: Duration) -> Result<()> {
        let mut changes = self.state_changes();
        match timeout(wait, changes.wait_for(|state| *state == SessionState::Open)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => Err(Error::transport(format!(
                "Session not open after {}ms (state: {})",
                wait.as_millis(),
                self.state()
            ))),
        }
    }
}

// ============================================================================
// Session - Commands
// ============================================================================

impl Session {
    /// Sends a command to the server.
    ///
    /// Queues the frame and returns without waiting for it to be written.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] unless the session is open; nothing is sent
    /// - [`Error::Json`] if encoding fails
    /// - [`Error::ConnectionClosed`] if the socket task just ended
    pub fn send(&self, command: CommandRequest) -> Result<()> {
        let connection = {
            let slot = self.inner.slot.lock();
            match (&slot.connection, slot.state) {
                (Some(connection), SessionState::Open) => connection.clone(),
                (_, state) => return Err(Error::not_connected(state)),
            }
        };

        let text = command.encode()?;
        trace!(id = %connection.id(), command = ?command.name(), "Sending command");
        connection.send_text(text)
    }

    /// Sends `{"cmd", "args", "kwargs"}`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn send_command(
        &self,
        cmd: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
        kwargs: Map<String, Value>,
    ) -> Result<()> {
        self.send(CommandRequest::structured(cmd, args, kwargs))
    }

    /// Sends `{"raw_input": text}`.
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn send_raw(&self, text: impl Into<String>) -> Result<()> {
        self.send(CommandRequest::raw(text))
    }

    /// Returns helpers for the task management commands.
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> TaskCommands<'_> {
        TaskCommands::new(self)
    }
}

// ============================================================================
// Session - Events
// ============================================================================

impl Session {
    /// Subscribes to classified events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.inner.dispatcher.bus().subscribe()
    }

    /// Subscribes to reports about dropped frames.
    #[must_use]
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.inner.dispatcher.diagnostics()
    }

    /// Subscribes to every inbound payload before decoding.
    #[must_use]
    pub fn raw_frames(&self) -> broadcast::Receiver<Arc<[u8]>> {
        self.inner.dispatcher.raw_frames()
    }

    /// Listens for local clone/modify task intents.
    #[must_use]
    pub fn intents(&self) -> IntentListener {
        self.inner.intents.listen()
    }

    /// Asks listeners to open the clone dialog for `task`.
    ///
    /// Returns the number of listeners notified.
    pub fn request_clone_task(&self, task: Value) -> usize {
        self.inner.intents.emit(TaskIntent::Clone(task))
    }

    /// Asks listeners to open the modify dialog for `task`.
    ///
    /// Returns the number of listeners notified.
    pub fn request_modify_task(&self, task: Value) -> usize {
        self.inner.intents.emit(TaskIntent::Modify(task))
    }
}

// ============================================================================
// Session - Accessors
// ============================================================================

impl Session {
    /// Returns `true` while the socket is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Returns the network monitor's current view.
    #[inline]
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner.network.is_online()
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.slot.lock().state
    }

    /// Subscribes to lifecycle state changes.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    /// Returns `true` while a reconnect timer is waiting to fire.
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.inner
            .slot
            .lock()
            .reconnect
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        self.inner.options.endpoint()
    }

    /// Returns the network monitor.
    #[inline]
    #[must_use]
    pub fn network(&self) -> &NetworkMonitor {
        &self.inner.network
    }
}

// ============================================================================
// SessionInner
// ============================================================================

impl SessionInner {
    /// Publishes a state transition.
    fn set_state(&self, slot: &mut Slot, state: SessionState) {
        if slot.state != state {
            debug!(from = %slot.state, to = %state, "Session state changed");
        }
        slot.state = state;
        self.state_tx.send_replace(state);
    }

    /// Replaces the socket slot with a fresh connection.
    fn open_socket(&self, slot: &mut Slot) {
        slot.generation = slot.generation.next();
        let handler = Arc::new(SessionHandler(self.this.clone()));

        slot.connection = Some(Connection::open(
            slot.generation,
            self.options.endpoint.clone(),
            handler,
        ));
        self.set_state(slot, SessionState::Connecting);
    }

    fn handle_open(&self, id: ConnectionId) {
        let on_ready = {
            let mut slot = self.slot.lock();
            if id != slot.generation || slot.state != SessionState::Connecting {
                debug!(%id, state = %slot.state, "Ignoring open of superseded socket");
                return;
            }

            slot.intentional_close = false;
            self.set_state(&mut slot, SessionState::Open);
            slot.on_ready.clone()
        };

        info!(%id, endpoint = %self.options.endpoint, "Session open");
        if let Some(on_ready) = on_ready {
            on_ready();
        }
    }

    fn handle_message(&self, id: ConnectionId, payload: &[u8]) {
        if self.slot.lock().generation != id {
            trace!(%id, "Ignoring frame from superseded socket");
            return;
        }
        self.dispatcher.dispatch(payload);
    }

    fn handle_close(&self, id: ConnectionId, closure: Closure) {
        let mut slot = self.slot.lock();
        if id != slot.generation {
            debug!(%id, "Ignoring close of superseded socket");
            return;
        }

        slot.connection = None;
        self.set_state(&mut slot, SessionState::Closed);

        let intentional = std::mem::take(&mut slot.intentional_close);
        let online = self.network.is_online();

        if closure.is_normal() || intentional || !online {
            info!(
                %id,
                code = closure.code,
                intentional,
                online,
                "Session closed, not reconnecting"
            );
            return;
        }

        self.schedule_reconnect(&mut slot, &closure);
    }

    /// Arms the one-shot reconnect timer.
    fn schedule_reconnect(&self, slot: &mut Slot, closure: &Closure) {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Cannot schedule reconnect without a runtime");
                return;
            }
        };

        let delay = self.options.reconnect_delay;
        let generation = slot.generation;
        let this = self.this.clone();

        info!(
            code = closure.code,
            reason = %closure.reason,
            delay_ms = delay.as_millis() as u64,
            "Session closed abnormally, reconnecting"
        );

        slot.cancel_reconnect();
        slot.reconnect = Some(runtime.spawn(async move {
            sleep(delay).await;
            if let Some(inner) = this.upgrade() {
                inner.reconnect(generation);
            }
        }));
    }

    /// Timer body: opens a new socket unless something else already did.
    fn reconnect(&self, generation: ConnectionId) {
        let mut slot = self.slot.lock();
        slot.reconnect = None;

        if slot.generation != generation || slot.state != SessionState::Closed {
            debug!(state = %slot.state, "Reconnect superseded");
            return;
        }

        debug!(endpoint = %self.options.endpoint, "Reconnecting");
        self.open_socket(&mut slot);
    }
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        let slot = self.slot.get_mut();
        slot.cancel_reconnect();
        if let Some(connection) = slot.connection.take() {
            connection.close(NORMAL_CLOSURE, "session dropped");
        }
    }
}

// ============================================================================
// SessionHandler
// ============================================================================

impl ConnectionHandler for SessionHandler {
    fn on_open(&self, id: ConnectionId) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_open(id);
        }
    }

    fn on_message(&self, id: ConnectionId, payload: &[u8]) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_message(id, payload);
        }
    }

    fn on_close(&self, id: ConnectionId, closure: Closure) {
        if let Some(inner) = self.0.upgrade() {
            inner.handle_close(id, closure);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::protocol::StreamType;
    use crate::transport::test_server::{ServerAction, TestServer};

    const WAIT: Duration = Duration::from_secs(5);
    const SHORT_DELAY: Duration = Duration::from_millis(50);

    fn session_for(server: &TestServer, network: NetworkMonitor) -> Session {
        Session::builder()
            .endpoint(server.endpoint().as_str())
            .reconnect_delay(SHORT_DELAY)
            .network(network)
            .build()
            .expect("session")
    }

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&count);
        (count, move || {
            hook.fetch_add(1, Ordering::SeqCst);
        })
    }

    async fn wait_count(count: &AtomicUsize, expected: usize) {
        timeout(WAIT, async {
            while count.load(Ordering::SeqCst) < expected {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("callback ran");
    }

    async fn wait_state(session: &Session, state: SessionState) {
        let mut changes = session.state_changes();
        timeout(WAIT, changes.wait_for(|current| *current == state))
            .await
            .expect("state reached")
            .expect("session alive");
    }

    #[test]
    fn test_starts_idle() {
        let session = Session::builder().build().expect("session");
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_connected());
        assert!(!session.reconnect_pending());
        assert_eq!(session.endpoint().as_str(), "ws://localhost:2269/stream");
    }

    #[test]
    fn test_enable_requires_runtime() {
        let session = Session::builder().build().expect("session");
        let err = session.enable(|| {}).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_send_rejected_when_idle() {
        let session = Session::builder().build().expect("session");
        let err = session.send_raw("ps").unwrap_err();
        assert!(matches!(
            err,
            Error::NotConnected {
                state: SessionState::Idle
            }
        ));
    }

    #[tokio::test]
    async fn test_enable_opens_and_runs_ready_once() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());
        let (ready, on_ready) = counter();

        session.enable(on_ready).expect("enable");
        session.wait_open(WAIT).await.expect("open");

        wait_count(&ready, 1).await;
        assert!(session.is_connected());
        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(server.accepted(), 1);
    }

    #[tokio::test]
    async fn test_enable_is_idempotent() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());

        session.enable(|| {}).expect("enable");
        session.enable(|| {}).expect("enable while connecting");
        session.wait_open(WAIT).await.expect("open");
        session.enable(|| {}).expect("enable while open");

        assert!(server.try_next_peer(WAIT).await.is_some());
        assert!(server.try_next_peer(Duration::from_millis(200)).await.is_none());
        assert_eq!(server.accepted(), 1);
    }

    #[tokio::test]
    async fn test_send_reaches_server() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());
        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let mut peer = server.next_peer().await;

        let mut kwargs = Map::new();
        kwargs.insert("n".into(), json!(1));
        session.send_command("ping", ["a"], kwargs).expect("sent");
        session.send_raw("ps").expect("sent");

        let structured: Value =
            serde_json::from_str(&peer.recv_text().await.expect("frame")).expect("json");
        assert_eq!(structured, json!({"cmd": "ping", "args": ["a"], "kwargs": {"n": 1}}));

        let raw: Value = serde_json::from_str(&peer.recv_text().await.expect("frame")).expect("json");
        assert_eq!(raw, json!({"raw_input": "ps"}));
    }

    #[tokio::test]
    async fn test_send_rejected_after_disable_without_traffic() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());
        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let mut peer = server.next_peer().await;

        session.disable();
        let err = session.send_raw("ps").unwrap_err();
        assert!(err.is_recoverable());
        wait_state(&session, SessionState::Closed).await;

        assert!(matches!(
            session.send_raw("ps"),
            Err(Error::NotConnected {
                state: SessionState::Closed
            })
        ));
        sleep(Duration::from_millis(50)).await;
        assert!(peer.try_recv_text().is_none());
    }

    #[tokio::test]
    async fn test_abnormal_close_reconnects_once_when_online() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::new(true));
        let (ready, on_ready) = counter();

        session.enable(on_ready).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let peer = server.next_peer().await;

        peer.act(ServerAction::Close(4000));

        let _second = server.next_peer().await;
        session.wait_open(WAIT).await.expect("reopened");
        wait_count(&ready, 2).await;
        sleep(Duration::from_millis(200)).await;

        assert_eq!(server.accepted(), 2);
        assert_eq!(ready.load(Ordering::SeqCst), 2);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_abnormal_close_offline_does_not_reconnect() {
        let server = TestServer::start().await;
        let network = NetworkMonitor::new(true);
        let session = session_for(&server, network.clone());

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let peer = server.next_peer().await;

        network.set_online(false);
        peer.act(ServerAction::Close(4000));
        wait_state(&session, SessionState::Closed).await;

        assert!(!session.reconnect_pending());
        sleep(Duration::from_millis(200)).await;
        assert_eq!(server.accepted(), 1);
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_server_normal_close_does_not_reconnect() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        server.next_peer().await.act(ServerAction::Close(1000));
        wait_state(&session, SessionState::Closed).await;

        sleep(Duration::from_millis(200)).await;
        assert_eq!(server.accepted(), 1);
        assert!(!session.reconnect_pending());
    }

    #[tokio::test]
    async fn test_disable_does_not_reconnect() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let _peer = server.next_peer().await;

        session.disable();
        assert_eq!(session.state(), SessionState::Closing);
        wait_state(&session, SessionState::Closed).await;

        sleep(Duration::from_millis(200)).await;
        assert_eq!(server.accepted(), 1);
        assert!(!session.reconnect_pending());
    }

    #[tokio::test]
    async fn test_disable_without_socket_is_noop() {
        let session = Session::builder().build().expect("session");
        session.disable();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_failed_connect_schedules_reconnect_and_disable_cancels_it() {
        let server = TestServer::start().await;
        let endpoint = server.endpoint();
        server.shutdown();
        sleep(Duration::from_millis(20)).await;

        let session = Session::builder()
            .endpoint(endpoint.as_str())
            .reconnect_delay(Duration::from_secs(30))
            .build()
            .expect("session");

        session.enable(|| {}).expect("enable");
        wait_state(&session, SessionState::Closed).await;
        assert!(session.reconnect_pending());

        session.disable();
        assert!(!session.reconnect_pending());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_enable_while_closing_reconnects_after_failed_connect() {
        let server = TestServer::start().await;
        let session = Session::builder()
            .endpoint(server.endpoint().as_str())
            .reconnect_delay(Duration::from_secs(30))
            .build()
            .expect("session");

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let _peer = server.next_peer().await;
        server.shutdown();
        sleep(Duration::from_millis(20)).await;

        session.disable();
        assert_eq!(session.state(), SessionState::Closing);

        session.enable(|| {}).expect("re-enable");
        wait_state(&session, SessionState::Closed).await;
        assert!(session.reconnect_pending());

        session.disable();
    }

    #[tokio::test]
    async fn test_enable_cancels_pending_reconnect() {
        let server = TestServer::start().await;
        let session = Session::builder()
            .endpoint(server.endpoint().as_str())
            .reconnect_delay(Duration::from_secs(30))
            .build()
            .expect("session");

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        server.next_peer().await.act(ServerAction::Close(4000));
        wait_state(&session, SessionState::Closed).await;
        assert!(session.reconnect_pending());

        session.enable(|| {}).expect("re-enable");
        assert!(!session.reconnect_pending());
        session.wait_open(WAIT).await.expect("reopened");
        assert_eq!(server.accepted(), 2);
    }

    #[tokio::test]
    async fn test_logger_frame_reaches_subscriber() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());
        let mut events = session.subscribe();

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let peer = server.next_peer().await;

        peer.act(ServerAction::Text(
            json!({"stream": "LOGGER", "data": {"ts": 1_700_000_000, "taskId": 7, "msg": "hello"}})
                .to_string(),
        ));

        let event = timeout(WAIT, events.recv_type(&StreamType::Logger))
            .await
            .expect("event")
            .expect("bus open");
        assert_eq!(event.task_id.as_u64(), 7);
        assert_eq!(event.text(), Some("2023-11-14T22:13:20.000Z 7 - hello"));
    }

    #[tokio::test]
    async fn test_malformed_frame_reported() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());
        let mut diagnostics = session.diagnostics();
        let mut raw = session.raw_frames();

        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        server
            .next_peer()
            .await
            .act(ServerAction::Text("not json".into()));

        let diagnostic = timeout(WAIT, diagnostics.recv())
            .await
            .expect("diagnostic")
            .expect("channel open");
        assert!(matches!(diagnostic, Diagnostic::MalformedFrame { .. }));

        let payload = timeout(WAIT, raw.recv()).await.expect("raw").expect("open");
        assert_eq!(&*payload, b"not json");
        assert!(session.is_connected());
    }

    #[test]
    fn test_task_intents() {
        let session = Session::builder().build().expect("session");
        let mut intents = session.intents();

        assert_eq!(session.request_modify_task(json!({"id": 3})), 1);
        assert_eq!(session.request_clone_task(json!({"id": 4})), 1);

        let modify = tokio_test::block_on(intents.recv()).expect("intent");
        assert_eq!(modify.stream_type(), StreamType::ModifyTask);
        assert_eq!(modify.task(), &json!({"id": 3}));

        let clone = tokio_test::block_on(intents.recv()).expect("intent");
        assert_eq!(clone, TaskIntent::Clone(json!({"id": 4})));
    }

    #[tokio::test]
    async fn test_dropping_session_closes_socket() {
        let server = TestServer::start().await;
        let session = session_for(&server, NetworkMonitor::default());
        session.enable(|| {}).expect("enable");
        session.wait_open(WAIT).await.expect("open");
        let mut peer = server.next_peer().await;

        drop(session);

        assert!(peer.recv_text().await.is_none());
        sleep(Duration::from_millis(200)).await;
        assert_eq!(server.accepted(), 1);
    }
}
