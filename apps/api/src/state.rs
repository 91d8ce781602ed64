use std::sync::Arc;

use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::admin::error_log::{ErrorLogStore, MemoryErrorLogStore, PgErrorLogStore};
use crate::chat::filter::Denylist;
use crate::chat::hub::ChatHub;
use crate::config::{Config, ResumeScorerKind};
use crate::discussions::store::{DiscussionStore, MemoryDiscussionStore, PgDiscussionStore};
use crate::profiles::store::{MemoryProfileStore, PgProfileStore, ProfileStore};
use crate::referrals::notify::{LogMailer, Mailer, WebhookMailer};
use crate::referrals::rate_limit::ReferralRateLimiter;
use crate::referrals::store::{MemoryReferralStore, PgReferralStore, ReferralStore};
use crate::resume::scoring::{KeywordAtsScorer, MockAtsScorer, ResumeScorer};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub profiles: Arc<dyn ProfileStore>,
    pub referrals: Arc<dyn ReferralStore>,
    pub discussions: Arc<dyn DiscussionStore>,
    pub error_logs: Arc<dyn ErrorLogStore>,
    /// Per-identity daily cap on referral requests. Redis-backed when `REDIS_URL` is set.
    pub rate_limiter: Arc<ReferralRateLimiter>,
    pub mailer: Arc<dyn Mailer>,
    pub chat: ChatHub,
    /// Pluggable ATS scorer. Default: MockAtsScorer. Swap via RESUME_SCORER.
    pub resume_scorer: Arc<dyn ResumeScorer>,
}

impl AppState {
    /// PostgreSQL-backed stores.
    pub fn postgres(config: Config, pool: PgPool, redis: Option<RedisClient>) -> Self {
        Self::assemble(
            config,
            Arc::new(PgProfileStore::new(pool.clone())),
            Arc::new(PgReferralStore::new(pool.clone())),
            Arc::new(PgDiscussionStore::new(pool.clone())),
            Arc::new(PgErrorLogStore::new(pool)),
            redis,
        )
    }

    /// Process-local stores. Used by `STORAGE_BACKEND=memory` and the router tests.
    pub fn in_memory(config: Config, redis: Option<RedisClient>) -> Self {
        Self::assemble(
            config,
            Arc::new(MemoryProfileStore::new()),
            Arc::new(MemoryReferralStore::new()),
            Arc::new(MemoryDiscussionStore::new()),
            Arc::new(MemoryErrorLogStore::new()),
            redis,
        )
    }

    fn assemble(
        config: Config,
        profiles: Arc<dyn ProfileStore>,
        referrals: Arc<dyn ReferralStore>,
        discussions: Arc<dyn DiscussionStore>,
        error_logs: Arc<dyn ErrorLogStore>,
        redis: Option<RedisClient>,
    ) -> Self {
        let mailer: Arc<dyn Mailer> = match &config.mail_webhook_url {
            Some(url) => Arc::new(WebhookMailer::new(url.clone(), config.mail_from.clone())),
            None => Arc::new(LogMailer),
        };
        let resume_scorer: Arc<dyn ResumeScorer> = match config.resume_scorer {
            ResumeScorerKind::Mock => Arc::new(MockAtsScorer),
            ResumeScorerKind::Keyword => Arc::new(KeywordAtsScorer),
        };

        Self {
            rate_limiter: Arc::new(ReferralRateLimiter::daily(
                config.referral_daily_limit,
                redis,
            )),
            chat: ChatHub::new(Denylist::new(&config.chat_denylist)),
            mailer,
            resume_scorer,
            profiles,
            referrals,
            discussions,
            error_logs,
            config,
        }
    }
}
