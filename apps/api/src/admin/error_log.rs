//! Append-only error log.
//!
//! Written by the `capture_server_errors` middleware and by client reports;
//! read by the admin panel. Entries are never updated or deleted.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::error_log::{ErrorLogEntry, NewErrorLog};

/// How many entries the admin panel shows.
pub const ERROR_LOG_PAGE: i64 = 50;

#[async_trait]
pub trait ErrorLogStore: Send + Sync {
    async fn append(&self, entry: NewErrorLog) -> Result<ErrorLogEntry, AppError>;

    /// Newest first.
    async fn latest(&self, limit: i64) -> Result<Vec<ErrorLogEntry>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

pub struct PgErrorLogStore {
    pool: PgPool,
}

impl PgErrorLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ErrorLogStore for PgErrorLogStore {
    async fn append(&self, entry: NewErrorLog) -> Result<ErrorLogEntry, AppError> {
        Ok(sqlx::query_as::<_, ErrorLogEntry>(
            "INSERT INTO error_logs (id, kind, detail) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&entry.kind)
        .bind(&entry.detail)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ErrorLogEntry>, AppError> {
        Ok(sqlx::query_as::<_, ErrorLogEntry>(
            "SELECT * FROM error_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM error_logs")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[derive(Default)]
pub struct MemoryErrorLogStore {
    // Insertion order is chronological.
    entries: RwLock<Vec<ErrorLogEntry>>,
}

impl MemoryErrorLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ErrorLogStore for MemoryErrorLogStore {
    async fn append(&self, entry: NewErrorLog) -> Result<ErrorLogEntry, AppError> {
        let stored = ErrorLogEntry {
            id: Uuid::new_v4(),
            kind: entry.kind,
            detail: entry.detail,
            created_at: Utc::now(),
        };
        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<ErrorLogEntry>, AppError> {
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().take(limit).cloned().collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.entries.read().await.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(detail: &str) -> NewErrorLog {
        NewErrorLog {
            kind: "client".to_string(),
            detail: detail.to_string(),
        }
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_capped() {
        let store = MemoryErrorLogStore::new();
        for i in 0..60 {
            store.append(entry(&format!("e{i}"))).await.unwrap();
        }
        let latest = store.latest(ERROR_LOG_PAGE).await.unwrap();
        assert_eq!(latest.len(), 50);
        assert_eq!(latest[0].detail, "e59");
        assert_eq!(latest[49].detail, "e10");
        assert_eq!(store.count().await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_latest_on_empty_log() {
        let store = MemoryErrorLogStore::new();
        assert!(store.latest(ERROR_LOG_PAGE).await.unwrap().is_empty());
    }
}
