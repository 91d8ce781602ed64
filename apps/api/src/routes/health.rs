use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version plus the configured storage, scorer and referral limit.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let config = &state.config;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "alumnet-api",
        "storage": config.storage.label(),
        "resumeScorer": config.resume_scorer.label(),
        "referralDailyLimit": config.referral_daily_limit
    }))
}
