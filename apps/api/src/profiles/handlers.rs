use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::errors::AppError;
use crate::models::profile::{
    AlumniProfile, AlumniProfileUpdate, NewAlumniProfile, NewStudentProfile, StudentProfile,
    StudentProfileUpdate,
};
use crate::profiles::search::{AlumniSearch, AlumniSearchParams};
use crate::state::AppState;
use crate::validation::{require_email, require_graduation_year, require_non_empty};

/// Only the profile owner or an admin may edit a profile.
fn ensure_owner(auth: &AuthUser, profile_id: Uuid) -> Result<(), AppError> {
    if auth.id == profile_id || auth.role == Role::Admin {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn ensure_package(package_lpa: f64) -> Result<(), AppError> {
    if package_lpa.is_finite() && package_lpa >= 0.0 {
        Ok(())
    } else {
        Err(AppError::Validation(
            "packageLPA must be a non-negative number".to_string(),
        ))
    }
}

/// POST /api/students
///
/// Creates the caller's student profile; the profile id is the caller id.
pub async fn handle_create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut req): Json<NewStudentProfile>,
) -> Result<(StatusCode, Json<StudentProfile>), AppError> {
    req.name = require_non_empty("name", &req.name)?;
    req.email = require_email("email", &req.email)?.to_lowercase();
    require_graduation_year(req.graduation_year)?;

    let profile = state.profiles.create_student(auth.id, req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/students/:id
pub async fn handle_get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentProfile>, AppError> {
    state
        .profiles
        .get_student(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Student {id} not found")))
}

/// PUT /api/students/:id
pub async fn handle_update_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(mut req): Json<StudentProfileUpdate>,
) -> Result<Json<StudentProfile>, AppError> {
    ensure_owner(&auth, id)?;
    if let Some(name) = &req.name {
        req.name = Some(require_non_empty("name", name)?);
    }
    if let Some(year) = req.graduation_year {
        require_graduation_year(year)?;
    }

    state
        .profiles
        .update_student(id, req)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Student {id} not found")))
}

/// POST /api/alumni
///
/// Creates the caller's alumni profile. New profiles are unverified and do
/// not appear in search until an admin approves them.
pub async fn handle_create_alumni(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut req): Json<NewAlumniProfile>,
) -> Result<(StatusCode, Json<AlumniProfile>), AppError> {
    req.name = require_non_empty("name", &req.name)?;
    req.email = require_email("email", &req.email)?.to_lowercase();
    req.company = require_non_empty("company", &req.company)?;
    require_graduation_year(req.graduation_year)?;
    ensure_package(req.package_lpa)?;

    let profile = state.profiles.create_alumni(auth.id, req).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/alumni/:id
pub async fn handle_get_alumni(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlumniProfile>, AppError> {
    state
        .profiles
        .get_alumni(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Alumni {id} not found")))
}

/// PUT /api/alumni/:id
pub async fn handle_update_alumni(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(mut req): Json<AlumniProfileUpdate>,
) -> Result<Json<AlumniProfile>, AppError> {
    ensure_owner(&auth, id)?;
    if let Some(name) = &req.name {
        req.name = Some(require_non_empty("name", name)?);
    }
    if let Some(company) = &req.company {
        req.company = Some(require_non_empty("company", company)?);
    }
    if let Some(year) = req.graduation_year {
        require_graduation_year(year)?;
    }
    if let Some(package) = req.package_lpa {
        ensure_package(package)?;
    }

    state
        .profiles
        .update_alumni(id, req)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Alumni {id} not found")))
}

/// GET /api/alumni/search?company=&graduationYear=&minPackage=
pub async fn handle_search_alumni(
    State(state): State<AppState>,
    Query(params): Query<AlumniSearchParams>,
) -> Result<Json<Vec<AlumniProfile>>, AppError> {
    let search = AlumniSearch::from_params(params)?;
    let found = state.profiles.search_alumni(&search).await?;
    Ok(Json(found))
}
