use anyhow::{bail, Context, Result};

use crate::chat::filter::DEFAULT_DENYLIST;

/// Where profile, referral, discussion and error-log records live.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    /// Process-local maps. Data is lost on restart.
    Memory,
}

impl StorageBackend {
    pub fn label(&self) -> &'static str {
        match self {
            StorageBackend::Postgres { .. } => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Which resume scorer backs `POST /api/resume/analyze`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeScorerKind {
    Mock,
    Keyword,
}

impl ResumeScorerKind {
    pub fn label(self) -> &'static str {
        match self {
            ResumeScorerKind::Mock => "mock",
            ResumeScorerKind::Keyword => "keyword",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a value does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    pub redis_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub referral_daily_limit: u32,
    pub mail_webhook_url: Option<String>,
    pub mail_from: String,
    pub chat_denylist: Vec<String>,
    pub resume_scorer: ResumeScorerKind,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup so parsing is testable
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage = match optional("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres {
                database_url: optional("DATABASE_URL").with_context(|| {
                    "Required environment variable 'DATABASE_URL' is not set".to_string()
                })?,
            },
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!("STORAGE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        };

        let resume_scorer = match optional("RESUME_SCORER").as_deref() {
            None | Some("mock") => ResumeScorerKind::Mock,
            Some("keyword") => ResumeScorerKind::Keyword,
            Some(other) => bail!("RESUME_SCORER must be 'mock' or 'keyword', got '{other}'"),
        };

        let chat_denylist = match optional("CHAT_DENYLIST") {
            Some(raw) => raw
                .split(',')
                .map(|w| w.trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            None => DEFAULT_DENYLIST.iter().map(|w| w.to_string()).collect(),
        };

        Ok(Config {
            storage,
            redis_url: optional("REDIS_URL"),
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            referral_daily_limit: optional("REFERRAL_DAILY_LIMIT")
                .unwrap_or_else(|| "3".to_string())
                .parse::<u32>()
                .context("REFERRAL_DAILY_LIMIT must be a non-negative integer")?,
            mail_webhook_url: optional("MAIL_WEBHOOK_URL"),
            mail_from: optional("MAIL_FROM")
                .unwrap_or_else(|| "no-reply@alumnet.local".to_string()),
            chat_denylist,
            resume_scorer,
        })
    }
}
