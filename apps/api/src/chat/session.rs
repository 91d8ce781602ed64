//! Per-connection chat socket loop.
//!
//! Multiplexes three sources: the heartbeat timer, the socket's outbound
//! queue fed by the hub, and inbound client frames. The connection pings
//! every 30s and is dropped after 90s without client traffic.

use std::time::{Duration, Instant};

use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chat::hub::{ChatHub, ConnectionId, RelayOutcome, OUTBOUND_BUFFER};
use crate::chat::messages::{ClientEvent, ServerEvent};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug)]
enum SessionError {
    ClientClosed,
    StreamClosed,
    HeartbeatTimeout,
    Network(axum::Error),
}

pub(super) async fn run_session(socket: WebSocket, hub: ChatHub) {
    let connection = Uuid::new_v4();
    let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
    let session = ChatSession {
        hub: hub.clone(),
        connection,
        outbound_tx,
    };

    debug!(%connection, "chat socket opened");
    let error = session.run(socket, outbound_rx).await;
    let user = hub.user_of(connection).await.unwrap_or_default();
    hub.disconnect(connection).await;

    match error {
        SessionError::ClientClosed | SessionError::StreamClosed => {
            debug!(%connection, %user, "chat socket closed")
        }
        SessionError::HeartbeatTimeout => warn!(%connection, %user, "chat socket idle, closing"),
        SessionError::Network(error) => {
            warn!(%connection, %user, error = %error, "chat socket failed")
        }
    }
}

struct ChatSession {
    hub: ChatHub,
    connection: ConnectionId,
    outbound_tx: mpsc::Sender<ServerEvent>,
}

impl ChatSession {
    async fn run(
        &self,
        mut socket: WebSocket,
        mut outbound_rx: mpsc::Receiver<ServerEvent>,
    ) -> SessionError {
        let mut last_seen = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            let result = tokio::select! {
                _ = heartbeat.tick() => {
                    Self::handle_heartbeat_tick(&mut socket, last_seen).await
                }
                Some(event) = outbound_rx.recv() => {
                    send_event(&mut socket, &event).await
                }
                frame = socket.recv() => {
                    self.handle_frame(&mut socket, &mut last_seen, frame).await
                }
            };

            if let Err(error) = result {
                let _ = socket.close().await;
                return error;
            }
        }
    }

    async fn handle_heartbeat_tick(
        socket: &mut WebSocket,
        last_seen: Instant,
    ) -> Result<(), SessionError> {
        if is_idle(last_seen, Instant::now()) {
            return Err(SessionError::HeartbeatTimeout);
        }
        socket
            .send(Message::Ping(Vec::new()))
            .await
            .map_err(SessionError::Network)
    }

    async fn handle_frame(
        &self,
        socket: &mut WebSocket,
        last_seen: &mut Instant,
        frame: Option<Result<Message, axum::Error>>,
    ) -> Result<(), SessionError> {
        let Some(frame) = frame else {
            return Err(SessionError::StreamClosed);
        };
        let message = frame.map_err(SessionError::Network)?;
        *last_seen = Instant::now();

        match message {
            Message::Text(text) => match self.handle_text(&text).await {
                Some(reply) => send_event(socket, &reply).await,
                None => Ok(()),
            },
            Message::Close(_) => Err(SessionError::ClientClosed),
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => Ok(()),
        }
    }

    /// Applies one client frame. Returns an event meant only for this socket.
    async fn handle_text(&self, text: &str) -> Option<ServerEvent> {
        let event = match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => event,
            Err(error) => {
                warn!(connection = %self.connection, error = %error, "ignoring malformed chat frame");
                return None;
            }
        };

        match event {
            ClientEvent::JoinRoom(join) => {
                self.hub
                    .join(
                        &join.room_id,
                        self.connection,
                        &join.user_id,
                        self.outbound_tx.clone(),
                    )
                    .await;
                let members = self.hub.room_size(&join.room_id).await;
                debug!(connection = %self.connection, room = %join.room_id, members, "joined chat room");
                None
            }
            ClientEvent::SendMessage(message) => match self.hub.relay(message).await {
                RelayOutcome::Broadcast { delivered } => {
                    debug!(connection = %self.connection, delivered, "chat message relayed");
                    None
                }
                RelayOutcome::Blocked(notice) => {
                    debug!(connection = %self.connection, room = %notice.room_id, "chat message blocked");
                    Some(ServerEvent::BlockedMessage(notice))
                }
            },
        }
    }
}

/// True once the client has been silent for longer than `CLIENT_TIMEOUT`.
fn is_idle(last_seen: Instant, now: Instant) -> bool {
    now.saturating_duration_since(last_seen) > CLIENT_TIMEOUT
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), SessionError> {
    match serde_json::to_string(event) {
        Ok(body) => socket
            .send(Message::Text(body))
            .await
            .map_err(SessionError::Network),
        Err(error) => {
            warn!(error = %error, "failed to serialize chat event");
            Ok(())
        }
    }
}
