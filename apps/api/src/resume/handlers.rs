use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::info;

use crate::errors::AppError;
use crate::resume::extract::{extract_text, read_upload};
use crate::resume::scoring::{AtsReport, ResumeDocument};
use crate::state::AppState;

/// POST /api/resume/analyze
/// Multipart: `resume` (PDF or text file, required), `jobDescription` (optional).
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AtsReport>, AppError> {
    let upload = read_upload(multipart).await?;
    let text = extract_text(&upload.file).await?;

    let document = ResumeDocument {
        text,
        job_description: upload.job_description,
    };
    let report = state.resume_scorer.score(&document).await?;

    info!(
        backend = %report.scorer_backend,
        score = report.overall_score,
        "resume analyzed"
    );
    Ok(Json(report))
}
