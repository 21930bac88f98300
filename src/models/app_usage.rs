use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::productivity::UsageTotal;

/// One sampled slice of foreground application usage.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AppUsageSample {
    pub id: i64,
    pub user_id: i64,
    pub session_id: Option<i64>,
    pub application_name: String,
    pub window_title: Option<String>,
    pub is_productive: bool,
    pub start_time: DateTime<Utc>,
    pub duration: Option<i64>,
}

pub struct NewAppSample {
    pub user_id: i64,
    pub session_id: Option<i64>,
    pub application_name: String,
    pub window_title: Option<String>,
    pub is_productive: bool,
    pub duration: Option<i64>,
}

const SELECT_SAMPLE: &str = "SELECT id, user_id, session_id, application_name, window_title, \
                             is_productive, start_time, duration FROM application_usage";

/// Most recent sample with a start time at or after `since`.
pub async fn latest_since(
    pool: &PgPool,
    user_id: i64,
    since: DateTime<Utc>,
) -> Result<Option<AppUsageSample>, sqlx::Error> {
    sqlx::query_as::<_, AppUsageSample>(&format!(
        "{SELECT_SAMPLE} WHERE user_id = $1 AND start_time >= $2 \
         ORDER BY start_time DESC LIMIT 1"
    ))
    .bind(user_id)
    .bind(since)
    .fetch_optional(pool)
    .await
}

pub async fn record(pool: &PgPool, new: &NewAppSample) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO application_usage \
         (user_id, session_id, application_name, window_title, is_productive, duration) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(new.user_id)
    .bind(new.session_id)
    .bind(&new.application_name)
    .bind(&new.window_title)
    .bind(new.is_productive)
    .bind(new.duration)
    .fetch_one(pool)
    .await
}

/// Per-application minute totals for samples started in [from, to),
/// biggest first. Input to the dashboard usage breakdown.
pub async fn totals_between(
    pool: &PgPool,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<UsageTotal>, sqlx::Error> {
    sqlx::query_as::<_, UsageTotal>(
        "SELECT application_name AS name, \
                COALESCE(SUM(duration), 0)::BIGINT AS minutes, \
                BOOL_OR(is_productive) AS is_productive \
         FROM application_usage \
         WHERE user_id = $1 AND start_time >= $2 AND start_time < $3 \
         GROUP BY application_name \
         ORDER BY minutes DESC",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}
