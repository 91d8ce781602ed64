use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::discussion::DiscussionPost;
use crate::profiles::search::escape_like;

/// A validated post ready to be stored.
#[derive(Debug, Clone)]
pub struct DiscussionDraft {
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    pub tags: Vec<String>,
}

/// `GET /api/discussions` filters. Blank values are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscussionFilter {
    /// Case-insensitive exact category.
    pub category: Option<String>,
    /// Exact tag, compared lowercased like stored tags.
    pub tag: Option<String>,
    /// Case-insensitive substring of title or body.
    pub q: Option<String>,
}

impl DiscussionFilter {
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            category: clean(self.category),
            tag: clean(self.tag).map(|t| t.to_lowercase()),
            q: clean(self.q),
        }
    }

    pub fn matches(&self, post: &DiscussionPost) -> bool {
        if let Some(category) = &self.category {
            if post.category.to_lowercase() != category.to_lowercase() {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !post.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let q = q.to_lowercase();
            if !post.title.to_lowercase().contains(&q) && !post.body.to_lowercase().contains(&q) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait DiscussionStore: Send + Sync {
    async fn create(&self, draft: DiscussionDraft) -> Result<DiscussionPost, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<DiscussionPost>, AppError>;

    /// Newest first.
    async fn list(&self, filter: &DiscussionFilter) -> Result<Vec<DiscussionPost>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;
}

pub struct PgDiscussionStore {
    pool: PgPool,
}

impl PgDiscussionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DiscussionStore for PgDiscussionStore {
    async fn create(&self, draft: DiscussionDraft) -> Result<DiscussionPost, AppError> {
        Ok(sqlx::query_as::<_, DiscussionPost>(
            r#"
            INSERT INTO discussions (id, author_id, title, body, category, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(draft.author_id)
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(&draft.category)
        .bind(&draft.tags)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DiscussionPost>, AppError> {
        Ok(
            sqlx::query_as::<_, DiscussionPost>("SELECT * FROM discussions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self, filter: &DiscussionFilter) -> Result<Vec<DiscussionPost>, AppError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM discussions WHERE TRUE");

        if let Some(category) = &filter.category {
            query
                .push(" AND LOWER(category) = LOWER(")
                .push_bind(category.clone())
                .push(")");
        }
        if let Some(tag) = &filter.tag {
            query.push(" AND ").push_bind(tag.clone()).push(" = ANY(tags)");
        }
        if let Some(q) = &filter.q {
            let pattern = format!("%{}%", escape_like(q));
            query
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR body ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        query.push(" ORDER BY created_at DESC");

        Ok(query
            .build_query_as::<DiscussionPost>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM discussions")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[derive(Default)]
pub struct MemoryDiscussionStore {
    posts: RwLock<HashMap<Uuid, DiscussionPost>>,
}

impl MemoryDiscussionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DiscussionStore for MemoryDiscussionStore {
    async fn create(&self, draft: DiscussionDraft) -> Result<DiscussionPost, AppError> {
        let post = DiscussionPost {
            id: Uuid::new_v4(),
            author_id: draft.author_id,
            title: draft.title,
            body: draft.body,
            category: draft.category,
            tags: draft.tags,
            created_at: Utc::now(),
        };
        self.posts.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DiscussionPost>, AppError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn list(&self, filter: &DiscussionFilter) -> Result<Vec<DiscussionPost>, AppError> {
        let posts = self.posts.read().await;
        let mut found: Vec<_> = posts.values().filter(|p| filter.matches(p)).cloned().collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.posts.read().await.len() as i64)
    }
}
