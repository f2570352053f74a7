// WebSocket transport state machine
//
// One driver task owns the socket for the lifetime of the transport:
//
//   Closed -> Connecting -> Open -> Closed -> (backoff) -> Connecting -> ...
//                             \-> Closing -> Closed        (explicit stop)
//
// Reconnection runs indefinitely at a fixed backoff while the transport is
// active and is cancelled the moment `shutdown()` is called. A reconnect
// never replays chunks queued against the previous connection.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::messages::{InboundMessage, OutboundMessage};

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Closed,
    Connecting,
    Open,
    Closing,
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Full WebSocket endpoint URL (see `wire::endpoint_url`)
    pub url: String,
    /// Delay before the single pending reconnect attempt
    pub reconnect_backoff: Duration,
}

impl TransportConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            reconnect_backoff: Duration::from_millis(1000),
        }
    }
}

/// Cloneable handle for sending and state inspection
#[derive(Clone)]
pub struct TransportHandle {
    outbound_tx: mpsc::Sender<OutboundMessage>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl TransportHandle {
    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Queue a message for transmission
    ///
    /// Valid only while Open; otherwise the message is silently discarded.
    /// Never blocks the caller.
    pub fn send(&self, message: OutboundMessage) {
        if self.state() != ConnectionState::Open {
            debug!("Outbound message dropped: connection not open");
            return;
        }
        if let Err(e) = self.outbound_tx.try_send(message) {
            debug!("Outbound message dropped: {}", e);
        }
    }
}

/// Owns the WebSocket connection to the transcription backend
///
/// At most one live connection per instance. Exactly one instance is active
/// at a time, owned by the session controller.
pub struct Transport {
    handle: TransportHandle,
    active_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl Transport {
    /// Open the connection and spawn the driver task
    ///
    /// Parsed inbound transcription messages are delivered through
    /// `inbound_tx` in wire-arrival order. A connect failure does not fail
    /// the spawn; the driver keeps retrying until `shutdown()`.
    pub fn spawn(config: TransportConfig, inbound_tx: mpsc::Sender<InboundMessage>) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Closed);
        let (outbound_tx, outbound_rx) = mpsc::channel(32);
        let (active_tx, active_rx) = watch::channel(true);

        let task = tokio::spawn(run_driver(
            config,
            state_tx,
            outbound_rx,
            inbound_tx,
            active_rx,
        ));

        Self {
            handle: TransportHandle {
                outbound_tx,
                state_rx,
            },
            active_tx,
            task: Some(task),
        }
    }

    /// Cloneable send/state handle
    pub fn handle(&self) -> TransportHandle {
        self.handle.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.handle.state()
    }

    pub fn send(&self, message: OutboundMessage) {
        self.handle.send(message);
    }

    /// Close the connection and cancel any pending reconnect
    ///
    /// Messages already queued are flushed best-effort before the close
    /// frame goes out.
    pub async fn shutdown(&mut self) {
        let _ = self.active_tx.send(false);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!("Transport driver panicked: {}", e);
            }
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Resolves once the transport has been deactivated
async fn deactivated(active_rx: &mut watch::Receiver<bool>) {
    while *active_rx.borrow() {
        if active_rx.changed().await.is_err() {
            break;
        }
    }
}

async fn run_driver(
    config: TransportConfig,
    state_tx: watch::Sender<ConnectionState>,
    mut outbound_rx: mpsc::Receiver<OutboundMessage>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    mut active_rx: watch::Receiver<bool>,
) {
    while *active_rx.borrow() {
        let _ = state_tx.send(ConnectionState::Connecting);
        info!("Connecting to {}", config.url);

        let attempt = tokio::select! {
            result = connect_async(config.url.as_str()) => Some(result),
            _ = deactivated(&mut active_rx) => None,
        };

        match attempt {
            Some(Ok((ws, _response))) => {
                info!("Connection established");

                // Drop anything queued against the previous connection:
                // dropped chunks are never replayed.
                while outbound_rx.try_recv().is_ok() {}

                let _ = state_tx.send(ConnectionState::Open);

                let lost = drive_connection(
                    ws,
                    &mut outbound_rx,
                    &inbound_tx,
                    &mut active_rx,
                    &state_tx,
                )
                .await;

                let _ = state_tx.send(ConnectionState::Closed);

                if !lost {
                    // Explicit stop
                    return;
                }
                warn!("Connection lost");
            }
            Some(Err(e)) => {
                let _ = state_tx.send(ConnectionState::Closed);
                warn!("Connect failed: {}", e);
            }
            None => {
                let _ = state_tx.send(ConnectionState::Closed);
                return;
            }
        }

        // Single pending reconnect, cancelled when the session stops
        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_backoff) => {}
            _ = deactivated(&mut active_rx) => {
                let _ = state_tx.send(ConnectionState::Closed);
                return;
            }
        }
    }

    let _ = state_tx.send(ConnectionState::Closed);
}

/// Pump one open connection. Returns true if it was lost unexpectedly,
/// false on explicit stop.
async fn drive_connection(
    mut ws: WsStream,
    outbound_rx: &mut mpsc::Receiver<OutboundMessage>,
    inbound_tx: &mpsc::Sender<InboundMessage>,
    active_rx: &mut watch::Receiver<bool>,
    state_tx: &watch::Sender<ConnectionState>,
) -> bool {
    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(message) => {
                        if !send_message(&mut ws, &message).await {
                            return true;
                        }
                    }
                    // All senders gone: treat as stop
                    None => return false,
                }
            }

            frame = ws.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => dispatch(&text, inbound_tx).await,
                    Some(Ok(Message::Close(_))) | None => return true,
                    Some(Ok(_)) => {} // ping/pong/binary: not part of the protocol
                    Some(Err(e)) => {
                        warn!("Socket error: {}", e);
                        return true;
                    }
                }
            }

            _ = deactivated(active_rx) => {
                let _ = state_tx.send(ConnectionState::Closing);

                // Best-effort flush of messages queued before shutdown
                // (the end-of-stream marker in particular)
                while let Ok(message) = outbound_rx.try_recv() {
                    if !send_message(&mut ws, &message).await {
                        break;
                    }
                }

                if let Err(e) = ws.close(None).await {
                    debug!("Close handshake failed: {}", e);
                }
                return false;
            }
        }
    }
}

async fn send_message(ws: &mut WsStream, message: &OutboundMessage) -> bool {
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to serialize outbound message: {}", e);
            return true;
        }
    };

    if let Err(e) = ws.send(Message::Text(text.into())).await {
        warn!("Send failed: {}", e);
        return false;
    }
    true
}

/// Parse one inbound text frame and forward it
///
/// Malformed frames are dropped and logged, never fatal to the connection;
/// unrecognized message types are ignored.
async fn dispatch(text: &str, inbound_tx: &mpsc::Sender<InboundMessage>) {
    match serde_json::from_str::<InboundMessage>(text) {
        Ok(InboundMessage::Unknown) => {
            debug!("Ignoring unrecognized message type");
        }
        Ok(message) => {
            if inbound_tx.send(message).await.is_err() {
                debug!("Inbound message dropped: receiver closed");
            }
        }
        Err(e) => {
            warn!("Malformed message dropped: {}", e);
        }
    }
}
