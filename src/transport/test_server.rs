//! Local WebSocket server for tests.
//!
//! Binds to `127.0.0.1:0`, accepts any number of clients and hands each one
//! out as a scripted [`Peer`].

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// How long `next_peer` waits for a client.
const PEER_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ServerAction
// ============================================================================

/// What a scripted peer does next.
#[derive(Debug, Clone)]
pub(crate) enum ServerAction {
    /// Send a text frame.
    Text(String),
    /// Start the closing handshake with this code.
    Close(u16),
}

// ============================================================================
// TestServer
// ============================================================================

/// A WebSocket server bound to a random local port.
pub(crate) struct TestServer {
    port: u16,
    accepted: Arc<AtomicUsize>,
    peers: Mutex<mpsc::UnboundedReceiver<Peer>>,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Binds and starts accepting.
    pub(crate) async fn start() -> Self {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);
        let listener = TcpListener::bind(addr).await.expect("bind test server");
        let port = listener.local_addr().expect("local addr").port();

        let accepted = Arc::new(AtomicUsize::new(0));
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();

        let counter = Arc::clone(&accepted);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(ws) = accept_async(stream).await else {
                    continue;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                if peer_tx.send(Peer::spawn(ws)).is_err() {
                    break;
                }
            }
        });

        Self {
            port,
            accepted,
            peers: Mutex::new(peer_rx),
            task,
        }
    }

    /// Returns the WebSocket URL for this server.
    pub(crate) fn endpoint(&self) -> Url {
        Url::parse(&format!("ws://127.0.0.1:{}/stream", self.port)).expect("valid url")
    }

    /// Number of completed WebSocket handshakes.
    pub(crate) fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Waits for the next client.
    pub(crate) async fn next_peer(&self) -> Peer {
        self.try_next_peer(PEER_TIMEOUT)
            .await
            .expect("client connected within timeout")
    }

    /// Waits up to `wait` for the next client.
    pub(crate) async fn try_next_peer(&self, wait: Duration) -> Option<Peer> {
        let mut peers = self.peers.lock().await;
        timeout(wait, peers.recv()).await.ok().flatten()
    }

    /// Stops accepting; the port is released.
    pub(crate) fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

// ============================================================================
// Peer
// ============================================================================

/// Server side of one accepted client.
pub(crate) struct Peer {
    actions: mpsc::UnboundedSender<ServerAction>,
    received: mpsc::UnboundedReceiver<String>,
}

impl Peer {
    fn spawn<S>(ws: tokio_tungstenite::WebSocketStream<S>) -> Self
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
    {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();
        let (received_tx, received_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let (mut write, mut read) = ws.split();
            let mut actions_open = true;

            loop {
                tokio::select! {
                    message = read.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            let _ = received_tx.send(text.as_str().to_owned());
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        _ => {}
                    },
                    action = action_rx.recv(), if actions_open => match action {
                        Some(ServerAction::Text(text)) => {
                            let _ = write.send(Message::Text(text.into())).await;
                        }
                        Some(ServerAction::Close(code)) => {
                            let _ = write
                                .send(Message::Close(Some(CloseFrame {
                                    code: CloseCode::from(code),
                                    reason: String::new().into(),
                                })))
                                .await;
                        }
                        None => actions_open = false,
                    },
                }
            }
            let _ = write.close().await;
        });

        Self {
            actions: action_tx,
            received: received_rx,
        }
    }

    /// Queues an action.
    pub(crate) fn act(&self, action: ServerAction) {
        let _ = self.actions.send(action);
    }

    /// Waits for the next text frame from the client.
    pub(crate) async fn recv_text(&mut self) -> Option<String> {
        timeout(PEER_TIMEOUT, self.received.recv()).await.ok().flatten()
    }

    /// Checks for a text frame without waiting.
    pub(crate) fn try_recv_text(&mut self) -> Option<String> {
        self.received.try_recv().ok()
    }
}
