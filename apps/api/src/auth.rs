//! Caller identity.
//!
//! Authentication happens at the gateway, which forwards the verified identity
//! as `x-user-id`, `x-user-email` and `x-user-role` headers. Handlers that need
//! a caller take an [`AuthUser`] argument; a missing or malformed id yields 401.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Alumni,
    Admin,
}

impl Role {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "alumni" => Some(Role::Alumni),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Stable key for per-identity counters such as the referral rate limit.
    pub fn identity_key(&self) -> String {
        self.id.to_string()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let id = header(USER_ID_HEADER)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or(AppError::Unauthorized)?;

        let role = match header(USER_ROLE_HEADER) {
            Some(raw) => Role::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("Unknown role '{raw}'")))?,
            None => Role::Student,
        };

        Ok(AuthUser {
            id,
            email: header(USER_EMAIL_HEADER).map(str::to_string),
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(builder: axum::http::request::Builder) -> Result<AuthUser, AppError> {
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AuthUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_missing_id_is_unauthorized() {
        let result = extract(Request::builder()).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_malformed_id_is_unauthorized() {
        let result = extract(Request::builder().header(USER_ID_HEADER, "not-a-uuid")).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_defaults_to_student_role() {
        let id = Uuid::new_v4();
        let user = extract(Request::builder().header(USER_ID_HEADER, id.to_string()))
            .await
            .unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.role, Role::Student);
        assert!(user.email.is_none());
        assert!(user.require_admin().is_err());
    }

    #[tokio::test]
    async fn test_admin_role_and_email() {
        let user = extract(
            Request::builder()
                .header(USER_ID_HEADER, Uuid::new_v4().to_string())
                .header(USER_EMAIL_HEADER, "root@college.edu")
                .header(USER_ROLE_HEADER, "Admin"),
        )
        .await
        .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email.as_deref(), Some("root@college.edu"));
        assert!(user.require_admin().is_ok());
    }

    #[tokio::test]
    async fn test_unknown_role_rejected() {
        let result = extract(
            Request::builder()
                .header(USER_ID_HEADER, Uuid::new_v4().to_string())
                .header(USER_ROLE_HEADER, "superuser"),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
