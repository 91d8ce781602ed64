//! Profile persistence.
//!
//! `AppState` holds an `Arc<dyn ProfileStore>`: `PgProfileStore` in
//! production, `MemoryProfileStore` for `STORAGE_BACKEND=memory` and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::{
    AlumniProfile, AlumniProfileUpdate, NewAlumniProfile, NewStudentProfile, ProfileCounts,
    StudentProfile, StudentProfileUpdate,
};
use crate::profiles::search::{escape_like, AlumniSearch};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn create_student(
        &self,
        id: Uuid,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile, AppError>;

    async fn get_student(&self, id: Uuid) -> Result<Option<StudentProfile>, AppError>;

    async fn update_student(
        &self,
        id: Uuid,
        update: StudentProfileUpdate,
    ) -> Result<Option<StudentProfile>, AppError>;

    async fn create_alumni(
        &self,
        id: Uuid,
        profile: NewAlumniProfile,
    ) -> Result<AlumniProfile, AppError>;

    async fn get_alumni(&self, id: Uuid) -> Result<Option<AlumniProfile>, AppError>;

    async fn update_alumni(
        &self,
        id: Uuid,
        update: AlumniProfileUpdate,
    ) -> Result<Option<AlumniProfile>, AppError>;

    /// Verified alumni matching `search`, by graduation year (newest first) then name.
    async fn search_alumni(&self, search: &AlumniSearch) -> Result<Vec<AlumniProfile>, AppError>;

    /// Every unverified alumni profile, oldest first. Unbounded.
    async fn list_pending_alumni(&self) -> Result<Vec<AlumniProfile>, AppError>;

    /// Sets the verified flag unconditionally. `None` if the profile does not exist.
    async fn set_alumni_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> Result<Option<AlumniProfile>, AppError>;

    async fn counts(&self) -> Result<ProfileCounts, AppError>;
}

fn duplicate_profile(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("A profile with this id or email already exists".to_string())
        }
        _ => AppError::Database(e),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn create_student(
        &self,
        id: Uuid,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile, AppError> {
        sqlx::query_as::<_, StudentProfile>(
            r#"
            INSERT INTO students (id, name, email, college, branch, graduation_year, skills, bio)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.college)
        .bind(&profile.branch)
        .bind(profile.graduation_year)
        .bind(&profile.skills)
        .bind(&profile.bio)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_profile)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<StudentProfile>, AppError> {
        Ok(
            sqlx::query_as::<_, StudentProfile>("SELECT * FROM students WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_student(
        &self,
        id: Uuid,
        update: StudentProfileUpdate,
    ) -> Result<Option<StudentProfile>, AppError> {
        Ok(sqlx::query_as::<_, StudentProfile>(
            r#"
            UPDATE students SET
                name = COALESCE($2, name),
                college = COALESCE($3, college),
                branch = COALESCE($4, branch),
                graduation_year = COALESCE($5, graduation_year),
                skills = COALESCE($6, skills),
                bio = COALESCE($7, bio)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.college)
        .bind(update.branch)
        .bind(update.graduation_year)
        .bind(update.skills)
        .bind(update.bio)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_alumni(
        &self,
        id: Uuid,
        profile: NewAlumniProfile,
    ) -> Result<AlumniProfile, AppError> {
        sqlx::query_as::<_, AlumniProfile>(
            r#"
            INSERT INTO alumni
                (id, name, email, company, designation, graduation_year,
                 package_lpa, skills, linkedin_url, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.company)
        .bind(&profile.designation)
        .bind(profile.graduation_year)
        .bind(profile.package_lpa)
        .bind(&profile.skills)
        .bind(&profile.linkedin_url)
        .fetch_one(&self.pool)
        .await
        .map_err(duplicate_profile)
    }

    async fn get_alumni(&self, id: Uuid) -> Result<Option<AlumniProfile>, AppError> {
        Ok(
            sqlx::query_as::<_, AlumniProfile>("SELECT * FROM alumni WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn update_alumni(
        &self,
        id: Uuid,
        update: AlumniProfileUpdate,
    ) -> Result<Option<AlumniProfile>, AppError> {
        Ok(sqlx::query_as::<_, AlumniProfile>(
            r#"
            UPDATE alumni SET
                name = COALESCE($2, name),
                company = COALESCE($3, company),
                designation = COALESCE($4, designation),
                graduation_year = COALESCE($5, graduation_year),
                package_lpa = COALESCE($6, package_lpa),
                skills = COALESCE($7, skills),
                linkedin_url = COALESCE($8, linkedin_url)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.company)
        .bind(update.designation)
        .bind(update.graduation_year)
        .bind(update.package_lpa)
        .bind(update.skills)
        .bind(update.linkedin_url)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn search_alumni(&self, search: &AlumniSearch) -> Result<Vec<AlumniProfile>, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM alumni WHERE is_verified = TRUE");

        if let Some(company) = &search.company {
            query
                .push(" AND company ILIKE ")
                .push_bind(format!("%{}%", escape_like(company)));
        }
        if let Some(year) = search.graduation_year {
            query.push(" AND graduation_year = ").push_bind(year);
        }
        if let Some(min) = search.min_package {
            query.push(" AND package_lpa >= ").push_bind(min);
        }
        query.push(" ORDER BY graduation_year DESC, name ASC");

        Ok(query
            .build_query_as::<AlumniProfile>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_pending_alumni(&self) -> Result<Vec<AlumniProfile>, AppError> {
        Ok(sqlx::query_as::<_, AlumniProfile>(
            "SELECT * FROM alumni WHERE is_verified = FALSE ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn set_alumni_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> Result<Option<AlumniProfile>, AppError> {
        Ok(sqlx::query_as::<_, AlumniProfile>(
            "UPDATE alumni SET is_verified = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn counts(&self) -> Result<ProfileCounts, AppError> {
        let (students, alumni, verified_alumni): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM students),
                COUNT(*),
                COUNT(*) FILTER (WHERE is_verified)
            FROM alumni
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(ProfileCounts {
            students,
            alumni,
            verified_alumni,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryProfileStore {
    students: RwLock<HashMap<Uuid, StudentProfile>>,
    alumni: RwLock<HashMap<Uuid, AlumniProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn create_student(
        &self,
        id: Uuid,
        profile: NewStudentProfile,
    ) -> Result<StudentProfile, AppError> {
        let mut students = self.students.write().await;
        if students.contains_key(&id) || students.values().any(|s| s.email == profile.email) {
            return Err(AppError::Conflict(
                "A profile with this id or email already exists".to_string(),
            ));
        }
        let created = StudentProfile {
            id,
            name: profile.name,
            email: profile.email,
            college: profile.college,
            branch: profile.branch,
            graduation_year: profile.graduation_year,
            skills: profile.skills,
            bio: profile.bio,
            created_at: Utc::now(),
        };
        students.insert(id, created.clone());
        Ok(created)
    }

    async fn get_student(&self, id: Uuid) -> Result<Option<StudentProfile>, AppError> {
        Ok(self.students.read().await.get(&id).cloned())
    }

    async fn update_student(
        &self,
        id: Uuid,
        update: StudentProfileUpdate,
    ) -> Result<Option<StudentProfile>, AppError> {
        let mut students = self.students.write().await;
        Ok(students.get_mut(&id).map(|profile| {
            update.apply(profile);
            profile.clone()
        }))
    }

    async fn create_alumni(
        &self,
        id: Uuid,
        profile: NewAlumniProfile,
    ) -> Result<AlumniProfile, AppError> {
        let mut alumni = self.alumni.write().await;
        if alumni.contains_key(&id) || alumni.values().any(|a| a.email == profile.email) {
            return Err(AppError::Conflict(
                "A profile with this id or email already exists".to_string(),
            ));
        }
        let created = AlumniProfile {
            id,
            name: profile.name,
            email: profile.email,
            company: profile.company,
            designation: profile.designation,
            graduation_year: profile.graduation_year,
            package_lpa: profile.package_lpa,
            skills: profile.skills,
            linkedin_url: profile.linkedin_url,
            is_verified: false,
            created_at: Utc::now(),
        };
        alumni.insert(id, created.clone());
        Ok(created)
    }

    async fn get_alumni(&self, id: Uuid) -> Result<Option<AlumniProfile>, AppError> {
        Ok(self.alumni.read().await.get(&id).cloned())
    }

    async fn update_alumni(
        &self,
        id: Uuid,
        update: AlumniProfileUpdate,
    ) -> Result<Option<AlumniProfile>, AppError> {
        let mut alumni = self.alumni.write().await;
        Ok(alumni.get_mut(&id).map(|profile| {
            update.apply(profile);
            profile.clone()
        }))
    }

    async fn search_alumni(&self, search: &AlumniSearch) -> Result<Vec<AlumniProfile>, AppError> {
        let alumni = self.alumni.read().await;
        let mut found: Vec<_> = alumni
            .values()
            .filter(|a| search.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.graduation_year
                .cmp(&a.graduation_year)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(found)
    }

    async fn list_pending_alumni(&self) -> Result<Vec<AlumniProfile>, AppError> {
        let alumni = self.alumni.read().await;
        let mut pending: Vec<_> = alumni.values().filter(|a| !a.is_verified).cloned().collect();
        pending.sort_by_key(|a| a.created_at);
        Ok(pending)
    }

    async fn set_alumni_verified(
        &self,
        id: Uuid,
        verified: bool,
    ) -> Result<Option<AlumniProfile>, AppError> {
        let mut alumni = self.alumni.write().await;
        Ok(alumni.get_mut(&id).map(|profile| {
            profile.is_verified = verified;
            profile.clone()
        }))
    }

    async fn counts(&self) -> Result<ProfileCounts, AppError> {
        let students = self.students.read().await.len() as i64;
        let alumni = self.alumni.read().await;
        Ok(ProfileCounts {
            students,
            alumni: alumni.len() as i64,
            verified_alumni: alumni.values().filter(|a| a.is_verified).count() as i64,
        })
    }
}
