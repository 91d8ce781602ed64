//! Referral request persistence. Records are never deleted.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::referral::{
    NewReferral, ReferralCounts, ReferralRequest, ReferralRow, ReferralStatus,
};

#[async_trait]
pub trait ReferralStore: Send + Sync {
    /// Stores a new request with status `pending`.
    async fn create(&self, referral: NewReferral) -> Result<ReferralRequest, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<ReferralRequest>, AppError>;

    /// Requests sent by a student, newest first.
    async fn list_by_sender(&self, student_id: Uuid) -> Result<Vec<ReferralRequest>, AppError>;

    /// Requests addressed to an email (case-insensitive), newest first.
    async fn list_for_recipient(&self, email: &str) -> Result<Vec<ReferralRequest>, AppError>;

    /// Moves a `pending` request to `status`. Returns `None` when the request
    /// is missing or no longer pending; nothing is written in that case.
    async fn resolve(
        &self,
        id: Uuid,
        status: ReferralStatus,
    ) -> Result<Option<ReferralRequest>, AppError>;

    async fn counts(&self) -> Result<ReferralCounts, AppError>;
}

fn into_requests(rows: Vec<ReferralRow>) -> Result<Vec<ReferralRequest>, AppError> {
    rows.into_iter()
        .map(|row| ReferralRequest::try_from(row).map_err(AppError::Internal))
        .collect()
}

fn into_request(row: Option<ReferralRow>) -> Result<Option<ReferralRequest>, AppError> {
    row.map(ReferralRequest::try_from)
        .transpose()
        .map_err(AppError::Internal)
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgReferralStore {
    pool: PgPool,
}

impl PgReferralStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralStore for PgReferralStore {
    async fn create(&self, referral: NewReferral) -> Result<ReferralRequest, AppError> {
        let row = sqlx::query_as::<_, ReferralRow>(
            r#"
            INSERT INTO referral_requests (id, from_student_id, to_email, message, status)
            VALUES ($1, $2, $3, $4, 'pending')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(referral.from_student_id)
        .bind(&referral.to_email)
        .bind(&referral.message)
        .fetch_one(&self.pool)
        .await?;

        ReferralRequest::try_from(row).map_err(AppError::Internal)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReferralRequest>, AppError> {
        let row = sqlx::query_as::<_, ReferralRow>("SELECT * FROM referral_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        into_request(row)
    }

    async fn list_by_sender(&self, student_id: Uuid) -> Result<Vec<ReferralRequest>, AppError> {
        let rows = sqlx::query_as::<_, ReferralRow>(
            "SELECT * FROM referral_requests WHERE from_student_id = $1 ORDER BY created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        into_requests(rows)
    }

    async fn list_for_recipient(&self, email: &str) -> Result<Vec<ReferralRequest>, AppError> {
        let rows = sqlx::query_as::<_, ReferralRow>(
            "SELECT * FROM referral_requests WHERE LOWER(to_email) = LOWER($1) ORDER BY created_at DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        into_requests(rows)
    }

    async fn resolve(
        &self,
        id: Uuid,
        status: ReferralStatus,
    ) -> Result<Option<ReferralRequest>, AppError> {
        // The status guard in WHERE makes concurrent responders race safely:
        // exactly one UPDATE matches.
        let row = sqlx::query_as::<_, ReferralRow>(
            r#"
            UPDATE referral_requests
            SET status = $2, responded_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        into_request(row)
    }

    async fn counts(&self) -> Result<ReferralCounts, AppError> {
        let (pending, accepted, rejected): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'accepted'),
                COUNT(*) FILTER (WHERE status = 'rejected')
            FROM referral_requests
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ReferralCounts {
            pending,
            accepted,
            rejected,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryReferralStore {
    requests: RwLock<HashMap<Uuid, ReferralRequest>>,
}

impl MemoryReferralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut requests: Vec<ReferralRequest>) -> Vec<ReferralRequest> {
    requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    requests
}

#[async_trait]
impl ReferralStore for MemoryReferralStore {
    async fn create(&self, referral: NewReferral) -> Result<ReferralRequest, AppError> {
        let request = ReferralRequest {
            id: Uuid::new_v4(),
            from_student_id: referral.from_student_id,
            to_email: referral.to_email,
            message: referral.message,
            status: ReferralStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };
        self.requests
            .write()
            .await
            .insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ReferralRequest>, AppError> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list_by_sender(&self, student_id: Uuid) -> Result<Vec<ReferralRequest>, AppError> {
        let requests = self.requests.read().await;
        Ok(newest_first(
            requests
                .values()
                .filter(|r| r.from_student_id == student_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_recipient(&self, email: &str) -> Result<Vec<ReferralRequest>, AppError> {
        let requests = self.requests.read().await;
        Ok(newest_first(
            requests
                .values()
                .filter(|r| r.to_email.eq_ignore_ascii_case(email))
                .cloned()
                .collect(),
        ))
    }

    async fn resolve(
        &self,
        id: Uuid,
        status: ReferralStatus,
    ) -> Result<Option<ReferralRequest>, AppError> {
        let mut requests = self.requests.write().await;
        Ok(requests
            .get_mut(&id)
            .filter(|r| r.status == ReferralStatus::Pending)
            .map(|r| {
                r.status = status;
                r.responded_at = Some(Utc::now());
                r.clone()
            }))
    }

    async fn counts(&self) -> Result<ReferralCounts, AppError> {
        let requests = self.requests.read().await;
        let mut counts = ReferralCounts::default();
        for request in requests.values() {
            match request.status {
                ReferralStatus::Pending => counts.pending += 1,
                ReferralStatus::Accepted => counts.accepted += 1,
                ReferralStatus::Rejected => counts.rejected += 1,
            }
        }
        Ok(counts)
    }
}
