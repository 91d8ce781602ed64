use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::discussions::store::{DiscussionDraft, DiscussionFilter};
use crate::errors::AppError;
use crate::models::discussion::{DiscussionPost, NewDiscussionPost};
use crate::state::AppState;
use crate::validation::require_non_empty;

const DEFAULT_CATEGORY: &str = "general";
const MAX_TAGS: usize = 10;

fn into_draft(author_id: Uuid, req: NewDiscussionPost) -> Result<DiscussionDraft, AppError> {
    let title = require_non_empty("title", &req.title)?;
    let body = require_non_empty("body", &req.body)?;
    let category = req
        .category
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let mut tags: Vec<String> = Vec::new();
    for tag in req.tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "A discussion can have at most {MAX_TAGS} tags"
        )));
    }

    Ok(DiscussionDraft {
        author_id,
        title,
        body,
        category,
        tags,
    })
}

/// POST /api/discussions
pub async fn handle_create_discussion(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<NewDiscussionPost>,
) -> Result<(StatusCode, Json<DiscussionPost>), AppError> {
    let draft = into_draft(auth.id, req)?;
    let post = state.discussions.create(draft).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /api/discussions?category=&tag=&q=
pub async fn handle_list_discussions(
    State(state): State<AppState>,
    Query(filter): Query<DiscussionFilter>,
) -> Result<Json<Vec<DiscussionPost>>, AppError> {
    let filter = filter.normalized();
    Ok(Json(state.discussions.list(&filter).await?))
}

/// GET /api/discussions/:id
pub async fn handle_get_discussion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscussionPost>, AppError> {
    state
        .discussions
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Discussion {id} not found")))
}
