use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only record of a server failure or a client-reported error.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ErrorLogEntry {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewErrorLog {
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: String,
}
