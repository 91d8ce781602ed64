use serde::Serialize;

use crate::errors::AppError;
use crate::models::profile::ProfileCounts;
use crate::models::referral::ReferralCounts;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub students: i64,
    pub alumni: i64,
    pub verified_alumni: i64,
    pub pending_alumni: i64,
    pub referrals: ReferralCounts,
    pub discussions: i64,
    pub error_logs: i64,
}

impl DashboardStats {
    pub fn from_counts(
        profiles: ProfileCounts,
        referrals: ReferralCounts,
        discussions: i64,
        error_logs: i64,
    ) -> Self {
        Self {
            students: profiles.students,
            alumni: profiles.alumni,
            verified_alumni: profiles.verified_alumni,
            pending_alumni: (profiles.alumni - profiles.verified_alumni).max(0),
            referrals,
            discussions,
            error_logs,
        }
    }
}

pub async fn collect_stats(state: &AppState) -> Result<DashboardStats, AppError> {
    let (profiles, referrals, discussions, error_logs) = tokio::try_join!(
        state.profiles.counts(),
        state.referrals.counts(),
        state.discussions.count(),
        state.error_logs.count(),
    )?;
    Ok(DashboardStats::from_counts(
        profiles,
        referrals,
        discussions,
        error_logs,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_unverified_alumni() {
        let stats = DashboardStats::from_counts(
            ProfileCounts {
                students: 12,
                alumni: 5,
                verified_alumni: 3,
            },
            ReferralCounts {
                pending: 4,
                accepted: 2,
                rejected: 1,
            },
            7,
            0,
        );
        assert_eq!(stats.pending_alumni, 2);
        assert_eq!(stats.students, 12);
        assert_eq!(stats.referrals.accepted, 2);
    }

    #[test]
    fn test_serializes_camel_case() {
        let stats = DashboardStats::from_counts(
            ProfileCounts::default(),
            ReferralCounts::default(),
            0,
            0,
        );
        let value = serde_json::to_value(&stats).unwrap();
        assert!(value.get("verifiedAlumni").is_some());
        assert!(value.get("errorLogs").is_some());
        assert_eq!(value["referrals"]["pending"], 0);
    }
}
