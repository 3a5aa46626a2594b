//! Connection lifecycle management for a channel socket.
//!
//! A [`ConnectionManager`] owns exactly one logical socket per channel
//! purpose and drives it through a timer-based reconnect state machine with
//! bounded exponential backoff. Consumers observe the socket through a typed
//! event stream and a watchable [`ConnectionState`]; nothing outside this
//! module touches the socket handle directly.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::ConnectionConfig;
use crate::error::SyncError;

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Well-known WebSocket close codes used by the reconnect policy.
///
/// The 4000 series is reserved for server-intentional closes; a socket
/// closed with one of these must not be resurrected by the client.
pub mod close_code {
    /// Normal closure requested by either side
    pub const NORMAL: u16 = 1000;
    /// Endpoint is going away (server shutdown, page navigation)
    pub const GOING_AWAY: u16 = 1001;
    /// No status code was present; treated as a clean EOF
    pub const NO_STATUS: u16 = 1005;
    /// Connection dropped without a close handshake
    pub const ABNORMAL: u16 = 1006;
    /// Application: handshake token was rejected
    pub const APP_AUTH_REJECTED: u16 = 4001;
    /// Application: user was removed from the group
    pub const APP_KICKED: u16 = 4002;
    /// Application: the group no longer exists
    pub const APP_GROUP_CLOSED: u16 = 4003;
    /// Inclusive bounds of the application-terminal range
    pub const APP_TERMINAL_MIN: u16 = 4000;
    pub const APP_TERMINAL_MAX: u16 = 4099;
}

/// Check whether a close code terminates the connection for good.
///
/// Terminal codes are the clean-closure set (1000, 1001, 1005) and the
/// application range 4000-4099; everything else (1006 abnormal, 1011 server
/// error, ...) is retriable.
pub fn is_terminal_close_code(code: u16) -> bool {
    matches!(
        code,
        close_code::NORMAL | close_code::GOING_AWAY | close_code::NO_STATUS
    ) || (close_code::APP_TERMINAL_MIN..=close_code::APP_TERMINAL_MAX).contains(&code)
}

/// Check whether a reconnect should be attempted after a close.
///
/// # Arguments
///
/// * `code` - The close code the socket ended with
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(code: u16, current_attempt: u32, max_attempts: u32) -> bool {
    if is_terminal_close_code(code) {
        return false;
    }

    current_attempt < max_attempts
}

/// Compute the backoff delay for a reconnect attempt (0-indexed).
///
/// Delay grows as `base * 2^attempt`, capped at `cap_delay_ms`.
pub fn backoff_delay(attempt: u32, config: &ConnectionConfig) -> Duration {
    let delay_ms = match 1u64.checked_shl(attempt) {
        Some(factor) => config
            .base_delay_ms
            .saturating_mul(factor)
            .min(config.cap_delay_ms),
        None => config.cap_delay_ms,
    };

    Duration::from_millis(delay_ms)
}

/// Build the dial URL with the bearer token appended as a query parameter.
///
/// An authority-only URL (`ws://host:port`) gets an explicit `/` path first;
/// a query built directly onto the authority is not a valid request-target
/// and the far end rejects the handshake.
pub fn compose_url(url: &str, token: &str) -> String {
    let path_start = url.find("://").map(|i| i + 3).unwrap_or(0);
    let query_start = url[path_start..].find('?').map(|i| path_start + i);

    let has_path = match query_start {
        Some(q) => url[path_start..q].contains('/'),
        None => url[path_start..].contains('/'),
    };

    let mut url = url.to_string();
    if !has_path {
        url.insert(query_start.unwrap_or(url.len()), '/');
    }

    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}token={}", url, separator, token)
}

/// Lifecycle state of a channel socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket and no pending attempt; a fresh `open()` starts a new cycle
    Disconnected,
    /// First connection attempt in flight
    Connecting,
    /// Socket is open and frames flow
    Connected,
    /// Waiting out a backoff delay before the next attempt
    Reconnecting,
    /// Closed for good (caller-initiated or terminal close code)
    Closed,
}

/// Events delivered on the connection event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The socket opened successfully
    Opened,
    /// A text frame arrived
    Message(String),
    /// The socket closed with the given code
    Closed { code: u16, reason: String },
    /// Socket construction or I/O failed; reported, never panics
    Error(String),
    /// All reconnect attempts were used up; the channel is degraded
    Exhausted,
}

struct Inner {
    config: ConnectionConfig,
    state_tx: watch::Sender<ConnectionState>,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    /// Write half of the live socket; `None` whenever no socket is held.
    /// Exclusively owned by this module.
    writer: tokio::sync::Mutex<Option<WsWriter>>,
}

/// Owns one logical socket for one channel purpose.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct ConnectionManager {
    inner: Arc<Inner>,
    /// Handle of the connect/reconnect task; at most one exists at a time
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Create a manager and the receiving end of its event stream
    pub fn new(config: ConnectionConfig) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        let manager = Self {
            inner: Arc::new(Inner {
                config,
                state_tx,
                events_tx,
                writer: tokio::sync::Mutex::new(None),
            }),
            task: tokio::sync::Mutex::new(None),
        };

        (manager, events_rx)
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to lifecycle state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Open the channel socket, appending the bearer token to the URL.
    ///
    /// Idempotent: calling while a connection attempt is in flight or a
    /// socket is live is a no-op, so re-running session setup can never
    /// produce two sockets. Calling during a backoff wait cancels the
    /// pending timer and starts a fresh attempt cycle immediately.
    pub async fn open(&self, url: &str, token: &str) {
        let mut task = self.task.lock().await;

        if matches!(
            self.state(),
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            tracing::debug!("open() ignored: connection already in progress");
            return;
        }

        // Cancels any pending backoff timer from a previous cycle
        if let Some(handle) = task.take() {
            handle.abort();
        }

        let url = compose_url(url, token);

        self.inner.state_tx.send_replace(ConnectionState::Connecting);
        *task = Some(tokio::spawn(run_connect_cycle(self.inner.clone(), url)));
    }

    /// Send a text frame over the live socket.
    ///
    /// Fails fast with [`SyncError::NotConnected`] while not connected; this
    /// core guarantees no message buffering.
    pub async fn send(&self, text: String) -> Result<(), SyncError> {
        if self.state() != ConnectionState::Connected {
            return Err(SyncError::NotConnected);
        }

        let mut writer = self.inner.writer.lock().await;
        match writer.as_mut() {
            Some(write) => write
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| SyncError::Transport(e.to_string())),
            None => Err(SyncError::NotConnected),
        }
    }

    /// Close the channel for good with the normal-closure code.
    ///
    /// Cancels the connect task and any pending backoff timer, so the far
    /// end and intermediaries do not attempt to resurrect the socket.
    pub async fn close(&self, reason: &str) {
        self.inner.state_tx.send_replace(ConnectionState::Closed);

        {
            let mut writer = self.inner.writer.lock().await;
            if let Some(write) = writer.as_mut() {
                let close_frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: reason.to_string().into(),
                };
                if let Err(e) = write.send(Message::Close(Some(close_frame))).await {
                    tracing::debug!("Close frame not delivered: {}", e);
                }
            }
            *writer = None;
        }

        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }

        tracing::info!("Connection closed by caller: {}", reason);
    }
}

/// Connect/reconnect cycle; exactly one of these tasks runs per manager.
///
/// The attempt counter spans the whole cycle and is only reset by a fresh
/// `open()` call, so a channel that keeps dropping abnormally gives up after
/// `max_attempts` rather than retrying forever.
async fn run_connect_cycle(inner: Arc<Inner>, url: String) {
    let mut attempt: u32 = 0;

    loop {
        match connect_async(&url).await {
            Ok((stream, _response)) => {
                let (write, mut read) = stream.split();

                // Single-socket invariant: the writer slot is the only
                // socket reference, and it is empty between connects
                *inner.writer.lock().await = Some(write);
                inner.state_tx.send_replace(ConnectionState::Connected);
                let _ = inner.events_tx.send(ConnectionEvent::Opened);
                tracing::info!("Channel socket connected");

                let (code, reason) = read_until_closed(&inner, &mut read).await;

                *inner.writer.lock().await = None;
                let _ = inner.events_tx.send(ConnectionEvent::Closed {
                    code,
                    reason: reason.clone(),
                });

                if *inner.state_tx.borrow() == ConnectionState::Closed {
                    // Caller-initiated close; close() owns the transition
                    return;
                }

                tracing::info!("Channel socket closed: code={} reason={}", code, reason);

                if !should_attempt_reconnect(code, attempt, inner.config.max_attempts) {
                    finish_cycle(&inner, code);
                    return;
                }
            }
            Err(e) => {
                let _ = inner
                    .events_tx
                    .send(ConnectionEvent::Error(format!("Connect failed: {}", e)));
                tracing::warn!("Connect failed: {}", e);

                // A failed dial counts like an abnormal close
                if !should_attempt_reconnect(close_code::ABNORMAL, attempt, inner.config.max_attempts)
                {
                    finish_cycle(&inner, close_code::ABNORMAL);
                    return;
                }
            }
        }

        let delay = backoff_delay(attempt, &inner.config);
        inner
            .state_tx
            .send_replace(ConnectionState::Reconnecting);
        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            attempt + 1,
            inner.config.max_attempts
        );

        // Single outstanding timer; aborting the task cancels it
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// Terminal transition at the end of a connect cycle
fn finish_cycle(inner: &Inner, code: u16) {
    if is_terminal_close_code(code) {
        inner.state_tx.send_replace(ConnectionState::Closed);
        tracing::info!("Channel closed for good (code {})", code);
    } else {
        inner
            .state_tx
            .send_replace(ConnectionState::Disconnected);
        let _ = inner.events_tx.send(ConnectionEvent::Exhausted);
        tracing::error!(
            "Giving up after {} reconnect attempts",
            inner.config.max_attempts
        );
    }
}

/// Pump inbound frames until the socket ends; returns the close code/reason
async fn read_until_closed(inner: &Inner, read: &mut WsReader) -> (u16, String) {
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                let _ = inner
                    .events_tx
                    .send(ConnectionEvent::Message(text.to_string()));
            }
            Ok(Message::Close(close_frame)) => {
                return match close_frame {
                    Some(frame) => (u16::from(frame.code), frame.reason.to_string()),
                    None => (close_code::NO_STATUS, String::new()),
                };
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Protocol-level ping/pong is handled by tungstenite
            }
            Ok(_) => {}
            Err(e) => {
                let _ = inner
                    .events_tx
                    .send(ConnectionEvent::Error(format!("Read error: {}", e)));
                return (close_code::ABNORMAL, e.to_string());
            }
        }
    }

    // EOF without a close handshake
    (close_code::ABNORMAL, "connection reset".to_string())
}
