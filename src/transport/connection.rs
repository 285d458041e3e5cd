//! WebSocket connection and event loop.
//!
//! This module owns one physical socket to the stream server. A
//! [`Connection`] is a cheap handle; the socket itself lives in a spawned
//! tokio task.
//!
//! # Event Loop
//!
//! The connection task handles:
//!
//! - The opening handshake (failure reported as an abnormal closure)
//! - Incoming text/binary payloads, handed to the [`ConnectionHandler`]
//! - Outgoing frames queued by the session
//! - The closing handshake and the final close code

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::{ABNORMAL_CLOSURE, NORMAL_CLOSURE};

// ============================================================================
// Constants
// ============================================================================

/// Close code for a close frame without a status.
const NO_STATUS_RECEIVED: u16 = 1005;

// ============================================================================
// Closure
// ============================================================================

/// How a socket ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    /// WebSocket close code.
    pub code: u16,
    /// Close reason or error description.
    pub reason: String,
}

impl Closure {
    /// Creates a closure record.
    #[inline]
    #[must_use]
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Socket died without a closing handshake.
    #[inline]
    #[must_use]
    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::new(ABNORMAL_CLOSURE, reason)
    }

    /// Returns `true` for the normal-closure code.
    #[inline]
    #[must_use]
    pub fn is_normal(&self) -> bool {
        self.code == NORMAL_CLOSURE
    }
}

impl From<CloseFrame> for Closure {
    fn from(frame: CloseFrame) -> Self {
        Self::new(u16::from(frame.code), frame.reason.as_str())
    }
}

// ============================================================================
// ConnectionHandler
// ============================================================================

/// Receiver of socket callbacks.
///
/// For one connection the callbacks run sequentially on its task: at most one
/// `on_open`, any number of `on_message`, then exactly one `on_close`.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// The opening handshake completed.
    fn on_open(&self, id: ConnectionId);

    /// A text or binary payload arrived.
    fn on_message(&self, id: ConnectionId, payload: &[u8]);

    /// The socket is gone, or never opened.
    fn on_close(&self, id: ConnectionId, closure: Closure);
}

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a text frame.
    Send(String),
    /// Start the closing handshake.
    Close(Closure),
}

// ============================================================================
// Connection
// ============================================================================

/// Handle to one WebSocket connection.
///
/// # Thread Safety
///
/// `Connection` is `Send + Sync`. All operations only queue work for the
/// connection task and return immediately.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Socket generation.
    id: ConnectionId,
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl Connection {
    /// Opens a connection to `endpoint`.
    ///
    /// Spawns the connection task; the handshake result arrives through
    /// `handler`. Must be called within a tokio runtime.
    pub(crate) fn open(id: ConnectionId, endpoint: Url, handler: Arc<dyn ConnectionHandler>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        tokio::spawn(Self::run(id, endpoint, command_rx, handler));

        Self { id, command_tx }
    }

    /// Returns the socket generation.
    #[inline]
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the connection task has ended.
    pub fn send_text(&self, text: String) -> Result<()> {
        self.command_tx
            .send(ConnectionCommand::Send(text))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Starts the closing handshake with `code`.
    ///
    /// Does not wait for the peer; the outcome arrives as `on_close`.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self
            .command_tx
            .send(ConnectionCommand::Close(Closure::new(code, reason)));
    }

    /// Connection task: handshake, then the I/O loop.
    async fn run(
        id: ConnectionId,
        endpoint: Url,
        command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        handler: Arc<dyn ConnectionHandler>,
    ) {
        debug!(%id, %endpoint, "Connecting");

        let closure = match Self::connect(&endpoint).await {
            Ok(ws_stream) => {
                info!(%id, %endpoint, "WebSocket connection established");
                handler.on_open(id);
                Self::run_event_loop(id, ws_stream, command_rx, &*handler).await
            }
            Err(e) => {
                warn!(%id, %endpoint, error = %e, "WebSocket connect failed");
                Closure::abnormal(e.to_string())
            }
        };

        info!(%id, code = closure.code, reason = %closure.reason, "WebSocket closed");
        handler.on_close(id, closure);
    }

    /// Performs the opening handshake.
    async fn connect(endpoint: &Url) -> Result<WebSocketStream<MaybeTlsStream<TcpStream>>> {
        let (ws_stream, _response) = connect_async(endpoint.as_str()).await?;
        Ok(ws_stream)
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        id: ConnectionId,
        ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        handler: &dyn ConnectionHandler,
    ) -> Closure {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let mut local_close: Option<Closure> = None;

        loop {
            tokio::select! {
                // Incoming messages from the server
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            handler.on_message(id, text.as_bytes());
                        }

                        Some(Ok(Message::Binary(bytes))) => {
                            handler.on_message(id, &bytes);
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(%id, ?frame, "Close frame received");
                            let _ = ws_write.close().await;
                            return frame
                                .map(Closure::from)
                                .or(local_close)
                                .unwrap_or_else(|| Closure::new(NO_STATUS_RECEIVED, ""));
                        }

                        Some(Err(e)) => {
                            error!(%id, error = %e, "WebSocket error");
                            return local_close.unwrap_or_else(|| Closure::abnormal(e.to_string()));
                        }

                        None => {
                            debug!(%id, "WebSocket stream ended");
                            return local_close
                                .unwrap_or_else(|| Closure::abnormal("stream ended"));
                        }

                        // Ignore Ping, Pong, raw frames
                        _ => {}
                    }
                }

                // Commands from the session
                command = command_rx.recv(), if local_close.is_none() => {
                    match command {
                        Some(ConnectionCommand::Send(text)) => {
                            if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                                error!(%id, error = %e, "Failed to send frame");
                                return Closure::abnormal(e.to_string());
                            }
                            trace!(%id, "Frame sent");
                        }

                        Some(ConnectionCommand::Close(closure)) => {
                            debug!(%id, code = closure.code, "Closing connection");
                            let frame = CloseFrame {
                                code: CloseCode::from(closure.code),
                                reason: closure.reason.clone().into(),
                            };
                            let sent = ws_write.send(Message::Close(Some(frame))).await;
                            local_close = Some(closure);
                            if let Err(e) = sent {
                                debug!(%id, error = %e, "Close frame not delivered");
                                return local_close.unwrap_or_else(|| Closure::abnormal(e.to_string()));
                            }
                        }

                        None => {
                            debug!(%id, "All handles dropped, closing");
                            let _ = ws_write.send(Message::Close(Some(CloseFrame {
                                code: CloseCode::Normal,
                                reason: String::new().into(),
                            }))).await;
                            local_close = Some(Closure::new(NORMAL_CLOSURE, "client dropped"));
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
