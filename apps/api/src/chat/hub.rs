use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::chat::filter::{Denylist, FilterVerdict};
use crate::chat::messages::{BlockedNotice, ChatMessage, SendMessage, ServerEvent};

pub type ConnectionId = Uuid;

/// Per-socket outbound queue depth. Events beyond this are dropped.
pub const OUTBOUND_BUFFER: usize = 64;

#[derive(Debug, PartialEq)]
pub enum RelayOutcome {
    /// Number of sockets the event was queued for.
    Broadcast { delivered: usize },
    Blocked(BlockedNotice),
}

#[derive(Default)]
struct HubState {
    rooms: HashMap<String, HashMap<ConnectionId, mpsc::Sender<ServerEvent>>>,
    users: HashMap<ConnectionId, String>,
}

/// In-memory room registry shared by every chat socket.
#[derive(Clone)]
pub struct ChatHub {
    state: Arc<RwLock<HubState>>,
    denylist: Arc<Denylist>,
}

impl ChatHub {
    pub fn new(denylist: Denylist) -> Self {
        Self {
            state: Arc::new(RwLock::new(HubState::default())),
            denylist: Arc::new(denylist),
        }
    }

    /// Adds a socket to a room and records which user owns it. Joining the
    /// same room again replaces the earlier registration.
    pub async fn join(
        &self,
        room_id: &str,
        connection: ConnectionId,
        user_id: &str,
        outbound: mpsc::Sender<ServerEvent>,
    ) {
        let mut state = self.state.write().await;
        state.users.insert(connection, user_id.to_string());
        state
            .rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(connection, outbound);
    }

    /// Filters the message, then queues it verbatim for every socket in the room.
    pub async fn relay(&self, message: SendMessage) -> RelayOutcome {
        if let FilterVerdict::Blocked { .. } = self.denylist.check(&message.message) {
            return RelayOutcome::Blocked(BlockedNotice {
                room_id: message.room_id,
                reason: "Message contains blocked content".to_string(),
            });
        }

        let event = ServerEvent::ReceiveMessage(ChatMessage {
            room_id: message.room_id.clone(),
            message: message.message,
            sender: message.sender,
            sent_at: Utc::now(),
        });

        let state = self.state.read().await;
        let delivered = state
            .rooms
            .get(&message.room_id)
            .map(|members| {
                members
                    .values()
                    .filter(|tx| tx.try_send(event.clone()).is_ok())
                    .count()
            })
            .unwrap_or(0);

        RelayOutcome::Broadcast { delivered }
    }

    /// Forgets a socket: leaves every room and drops its user mapping.
    pub async fn disconnect(&self, connection: ConnectionId) {
        let mut state = self.state.write().await;
        state.users.remove(&connection);
        state.rooms.retain(|_, members| {
            members.remove(&connection);
            !members.is_empty()
        });
    }

    pub async fn user_of(&self, connection: ConnectionId) -> Option<String> {
        self.state.read().await.users.get(&connection).cloned()
    }

    pub async fn room_size(&self, room_id: &str) -> usize {
        self.state
            .read()
            .await
            .rooms
            .get(room_id)
            .map_or(0, HashMap::len)
    }
}
