use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::referral::ReferralRequest;
use crate::referrals::workflow::{respond, send_request, RespondRequest, SendReferralRequest};
use crate::state::AppState;

/// POST /api/referrals
///
/// Rate limited per caller by `enforce_referral_limit`.
pub async fn handle_send_referral(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SendReferralRequest>,
) -> Result<(StatusCode, Json<ReferralRequest>), AppError> {
    let created = send_request(state.referrals.as_ref(), state.mailer.clone(), auth.id, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/referrals/sent
pub async fn handle_list_sent(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ReferralRequest>>, AppError> {
    Ok(Json(state.referrals.list_by_sender(auth.id).await?))
}

/// GET /api/referrals/received
pub async fn handle_list_received(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ReferralRequest>>, AppError> {
    let email = auth.email.as_deref().ok_or_else(|| {
        AppError::Validation("x-user-email is required to list received referrals".to_string())
    })?;
    Ok(Json(state.referrals.list_for_recipient(email).await?))
}

/// POST /api/referrals/:id/respond
pub async fn handle_respond(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<ReferralRequest>, AppError> {
    let updated = respond(
        state.referrals.as_ref(),
        state.profiles.as_ref(),
        state.mailer.clone(),
        &auth,
        id,
        &req.action,
    )
    .await?;
    Ok(Json(updated))
}
