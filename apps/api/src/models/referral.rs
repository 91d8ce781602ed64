use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Accepted => "accepted",
            ReferralStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ReferralStatus::Pending),
            "accepted" => Some(ReferralStatus::Accepted),
            "rejected" => Some(ReferralStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReferralStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRequest {
    pub id: Uuid,
    pub from_student_id: Uuid,
    pub to_email: String,
    pub message: String,
    pub status: ReferralStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Database row; `status` is stored as TEXT and checked on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct ReferralRow {
    pub id: Uuid,
    pub from_student_id: Uuid,
    pub to_email: String,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReferralRow> for ReferralRequest {
    type Error = anyhow::Error;

    fn try_from(row: ReferralRow) -> Result<Self, Self::Error> {
        let status = ReferralStatus::parse(&row.status).ok_or_else(|| {
            anyhow::anyhow!("referral {} has unknown status '{}'", row.id, row.status)
        })?;
        Ok(ReferralRequest {
            id: row.id,
            from_student_id: row.from_student_id,
            to_email: row.to_email,
            message: row.message,
            status,
            created_at: row.created_at,
            responded_at: row.responded_at,
        })
    }
}

/// A validated referral about to be stored as `pending`.
#[derive(Debug, Clone)]
pub struct NewReferral {
    pub from_student_id: Uuid,
    pub to_email: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReferralCounts {
    pub pending: i64,
    pub accepted: i64,
    pub rejected: i64,
}
