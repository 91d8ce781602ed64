use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::admin::error_log::ERROR_LOG_PAGE;
use crate::admin::stats::{collect_stats, DashboardStats};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::error_log::{ErrorLogEntry, NewErrorLog};
use crate::models::profile::AlumniProfile;
use crate::state::AppState;
use crate::validation::require_non_empty;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub approve: bool,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// POST /api/admin/profile/:id/verify
///
/// Sets the alumni verified flag to `approve`. Repeating the call is a no-op.
pub async fn handle_verify_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    auth.require_admin()?;

    state
        .profiles
        .set_alumni_verified(id, req.approve)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Alumni {id} not found")))?;

    tracing::info!("Admin {} set alumni {id} verified={}", auth.id, req.approve);
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/admin/pending
pub async fn handle_list_pending(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<AlumniProfile>>, AppError> {
    auth.require_admin()?;
    Ok(Json(state.profiles.list_pending_alumni().await?))
}

/// GET /api/admin/error-logs
///
/// Latest 50 entries, newest first.
pub async fn handle_error_logs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ErrorLogEntry>>, AppError> {
    auth.require_admin()?;
    Ok(Json(state.error_logs.latest(ERROR_LOG_PAGE).await?))
}

/// POST /api/admin/error-logs
///
/// Client-side error report. Any authenticated caller may append.
pub async fn handle_report_error(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<NewErrorLog>,
) -> Result<(StatusCode, Json<ErrorLogEntry>), AppError> {
    let entry = NewErrorLog {
        kind: require_non_empty("type", &req.kind)?,
        detail: require_non_empty("detail", &req.detail)?,
    };
    let stored = state.error_logs.append(entry).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DashboardStats>, AppError> {
    auth.require_admin()?;
    Ok(Json(collect_stats(&state).await?))
}
