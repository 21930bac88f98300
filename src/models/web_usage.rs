use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::productivity::UsageTotal;

/// One sampled slice of website usage, keyed by domain.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WebUsageSample {
    pub id: i64,
    pub user_id: i64,
    pub session_id: Option<i64>,
    pub domain: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub is_productive: bool,
    pub start_time: DateTime<Utc>,
    pub duration: Option<i64>,
}

pub struct NewWebSample {
    pub user_id: i64,
    pub session_id: Option<i64>,
    pub domain: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub is_productive: bool,
    pub duration: Option<i64>,
}

const SELECT_SAMPLE: &str = "SELECT id, user_id, session_id, domain, url, title, \
                             is_productive, start_time, duration FROM website_usage";

/// Most recent sample with a start time at or after `since`.
pub async fn latest_since(
    pool: &PgPool,
    user_id: i64,
    since: DateTime<Utc>,
) -> Result<Option<WebUsageSample>, sqlx::Error> {
    sqlx::query_as::<_, WebUsageSample>(&format!(
        "{SELECT_SAMPLE} WHERE user_id = $1 AND start_time >= $2 \
         ORDER BY start_time DESC LIMIT 1"
    ))
    .bind(user_id)
    .bind(since)
    .fetch_optional(pool)
    .await
}

pub async fn record(pool: &PgPool, new: &NewWebSample) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO website_usage \
         (user_id, session_id, domain, url, title, is_productive, duration) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
    )
    .bind(new.user_id)
    .bind(new.session_id)
    .bind(&new.domain)
    .bind(&new.url)
    .bind(&new.title)
    .bind(new.is_productive)
    .bind(new.duration)
    .fetch_one(pool)
    .await
}

/// Per-domain minute totals for samples started in [from, to), biggest first.
pub async fn totals_between(
    pool: &PgPool,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<UsageTotal>, sqlx::Error> {
    sqlx::query_as::<_, UsageTotal>(
        "SELECT domain AS name, \
                COALESCE(SUM(duration), 0)::BIGINT AS minutes, \
                BOOL_OR(is_productive) AS is_productive \
         FROM website_usage \
         WHERE user_id = $1 AND start_time >= $2 AND start_time < $3 \
         GROUP BY domain \
         ORDER BY minutes DESC",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
