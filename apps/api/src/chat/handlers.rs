use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::chat::filter::room_id;
use crate::chat::session::run_session;
use crate::errors::AppError;
use crate::state::AppState;
use crate::validation::require_non_empty;

/// GET /ws/chat
pub async fn handle_chat_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = state.chat.clone();
    ws.on_upgrade(move |socket| run_session(socket, hub))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub user_a: Option<String>,
    pub user_b: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    pub room_id: String,
}

/// GET /api/chat/room?userA=&userB=
pub async fn handle_room_id(
    Query(query): Query<RoomQuery>,
) -> Result<Json<RoomResponse>, AppError> {
    let user_a = require_non_empty("userA", query.user_a.as_deref().unwrap_or_default())?;
    let user_b = require_non_empty("userB", query.user_b.as_deref().unwrap_or_default())?;
    Ok(Json(RoomResponse {
        room_id: room_id(&user_a, &user_b),
    }))
}
