//! Rolling-window limit on referral creation, keyed by caller identity.
//!
//! Counts live in a Redis sorted set (one member per accepted request, scored
//! by timestamp) when Redis is configured. Any Redis failure falls back to the
//! in-process sliding log, so counts are per-instance until Redis recovers.

use std::collections::{HashMap, VecDeque};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

const REDIS_KEY_PREFIX: &str = "alumnet:referral-rate";

pub struct ReferralRateLimiter {
    limit: u32,
    window: Duration,
    redis: Option<redis::Client>,
    local: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl ReferralRateLimiter {
    pub fn new(limit: u32, window: Duration, redis: Option<redis::Client>) -> Self {
        Self {
            limit,
            window,
            redis,
            local: Mutex::new(HashMap::new()),
        }
    }

    /// `limit` requests per rolling 24 hours.
    pub fn daily(limit: u32, redis: Option<redis::Client>) -> Self {
        Self::new(limit, Duration::hours(24), redis)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Records an attempt for `key` and reports whether it fits in the window.
    /// Rejected attempts are not recorded.
    pub async fn allow(&self, key: &str) -> bool {
        let now = Utc::now();
        if let Some(client) = &self.redis {
            match self.allow_redis(client, key, now).await {
                Ok(allowed) => return allowed,
                Err(e) => warn!(key, "redis rate-limit fallback: {e}"),
            }
        }
        self.allow_local_at(key, now).await
    }

    async fn allow_redis(
        &self,
        client: &redis::Client,
        key: &str,
        now: DateTime<Utc>,
    ) -> redis::RedisResult<bool> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let redis_key = format!("{REDIS_KEY_PREFIX}:{key}");
        let now_ms = now.timestamp_millis();
        let cutoff_ms = now_ms - self.window.num_milliseconds();
        let member = format!("{now_ms}-{}", Uuid::new_v4());

        let (_, _, count, _): (i64, i64, i64, i64) = redis::pipe()
            .atomic()
            .zrembyscore(&redis_key, "-inf", cutoff_ms)
            .zadd(&redis_key, &member, now_ms)
            .zcard(&redis_key)
            .expire(&redis_key, self.window.num_seconds())
            .query_async(&mut conn)
            .await?;

        if count > i64::from(self.limit) {
            let _: i64 = conn.zrem(&redis_key, &member).await?;
            return Ok(false);
        }
        Ok(true)
    }

    async fn allow_local_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let cutoff = now - self.window;
        let mut local = self.local.lock().await;
        // Drop aged-out attempts for every identity; drained logs are removed.
        local.retain(|_, log| {
            while log.front().is_some_and(|t| *t <= cutoff) {
                log.pop_front();
            }
            !log.is_empty()
        });

        let used = local.get(key).map_or(0, VecDeque::len);
        if used >= self.limit as usize {
            return false;
        }
        local.entry(key.to_string()).or_default().push_back(now);
        true
    }
}

/// Route middleware for `POST /api/referrals`.
pub async fn enforce_referral_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.rate_limiter.allow(&auth.identity_key()).await {
        return Err(AppError::RateLimited(format!(
            "At most {} referral requests per day; try again later",
            state.rate_limiter.limit()
        )));
    }
    Ok(next.run(request).await)
}
