//! Referral request lifecycle: `pending` → `accepted` | `rejected`, once.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::referral::{NewReferral, ReferralRequest, ReferralStatus};
use crate::profiles::store::ProfileStore;
use crate::referrals::notify::{
    dispatch, referral_requested_mail, referral_responded_mail, Mailer,
};
use crate::referrals::store::ReferralStore;
use crate::validation::{require_email, require_non_empty};

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReferralRequest {
    pub to_email: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: String,
}

/// Validates and stores a new `pending` request, then notifies the recipient
/// in the background.
pub async fn send_request(
    referrals: &dyn ReferralStore,
    mailer: Arc<dyn Mailer>,
    from_student_id: Uuid,
    request: SendReferralRequest,
) -> Result<ReferralRequest, AppError> {
    let to_email = require_email("toEmail", &request.to_email)?.to_lowercase();
    let message = require_non_empty("message", &request.message)?;
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message cannot exceed {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let created = referrals
        .create(NewReferral {
            from_student_id,
            to_email,
            message,
        })
        .await?;

    info!(
        "Referral {} created by {} for {}",
        created.id, created.from_student_id, created.to_email
    );
    dispatch(mailer, referral_requested_mail(&created));

    Ok(created)
}

/// Only `accepted` and `rejected` are valid responses.
pub fn parse_action(raw: &str) -> Result<ReferralStatus, AppError> {
    match ReferralStatus::parse(raw.trim()) {
        Some(status) if status.is_terminal() => Ok(status),
        _ => Err(AppError::Validation(format!(
            "action must be 'accepted' or 'rejected', got '{raw}'"
        ))),
    }
}

/// Applies the recipient's decision. The action is validated before any
/// lookup, so an invalid action never touches the store.
pub async fn respond(
    referrals: &dyn ReferralStore,
    profiles: &dyn ProfileStore,
    mailer: Arc<dyn Mailer>,
    responder: &AuthUser,
    referral_id: Uuid,
    action: &str,
) -> Result<ReferralRequest, AppError> {
    let status = parse_action(action)?;

    let existing = referrals
        .get(referral_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Referral {referral_id} not found")))?;

    let is_recipient = responder
        .email
        .as_deref()
        .is_some_and(|email| email.eq_ignore_ascii_case(&existing.to_email));
    if !is_recipient {
        return Err(AppError::Forbidden);
    }

    if existing.status.is_terminal() {
        return Err(already_resolved(referral_id, existing.status));
    }

    // `resolve` re-checks `pending`; losing a race with another responder
    // surfaces as the same conflict.
    let updated = match referrals.resolve(referral_id, status).await? {
        Some(updated) => updated,
        None => {
            let current = referrals
                .get(referral_id)
                .await?
                .map(|r| r.status)
                .unwrap_or(status);
            return Err(already_resolved(referral_id, current));
        }
    };

    info!("Referral {} {}", updated.id, updated.status.as_str());

    match profiles.get_student(updated.from_student_id).await {
        Ok(Some(student)) => dispatch(mailer, referral_responded_mail(&updated, &student.email)),
        Ok(None) => {}
        Err(e) => warn!("Skipping response mail for referral {}: {e}", updated.id),
    }

    Ok(updated)
}

fn already_resolved(referral_id: Uuid, status: ReferralStatus) -> AppError {
    AppError::Conflict(format!(
        "Referral {referral_id} was already {}",
        status.as_str()
    ))
}
