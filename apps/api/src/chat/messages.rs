//! Wire-level chat frames: `{"event": "<name>", "data": {...}}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inbound frames sent by the client.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinRoom(JoinRoom),
    SendMessage(SendMessage),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoom {
    pub room_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub room_id: String,
    pub message: String,
    pub sender: String,
}

/// Outbound frames emitted by the relay.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    ReceiveMessage(ChatMessage),
    BlockedMessage(BlockedNotice),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub room_id: String,
    pub message: String,
    pub sender: String,
    pub sent_at: DateTime<Utc>,
}

/// Sent only to the author of a message the filter rejected.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlockedNotice {
    pub room_id: String,
    pub reason: String,
}
