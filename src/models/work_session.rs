use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// A tracked work session. `session_end` is NULL while the session is open,
/// which is what "currently online" means everywhere in the app.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WorkSession {
    pub id: i64,
    pub user_id: i64,
    pub session_start: DateTime<Utc>,
    pub session_end: Option<DateTime<Utc>>,
    pub total_duration: Option<i64>,
}

impl WorkSession {
    pub fn is_open(&self) -> bool {
        self.session_end.is_none()
    }
}

const SELECT_SESSION: &str =
    "SELECT id, user_id, session_start, session_end, total_duration FROM user_sessions";

/// The user's open session, if any. Takes the most recent by start time
/// should more than one open row exist.
pub async fn find_open(pool: &PgPool, user_id: i64) -> Result<Option<WorkSession>, sqlx::Error> {
    sqlx::query_as::<_, WorkSession>(&format!(
        "{SELECT_SESSION} WHERE user_id = $1 AND session_end IS NULL \
         ORDER BY session_start DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Open a new session starting now.
pub async fn start(pool: &PgPool, user_id: i64) -> Result<WorkSession, sqlx::Error> {
    sqlx::query_as::<_, WorkSession>(
        "INSERT INTO user_sessions (user_id) VALUES ($1) \
         RETURNING id, user_id, session_start, session_end, total_duration",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Close a session, computing its duration in whole minutes.
/// Returns the recorded duration, or None if the session did not exist.
pub async fn end(pool: &PgPool, session_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        "UPDATE user_sessions \
         SET session_end = now(), \
             total_duration = FLOOR(EXTRACT(EPOCH FROM (now() - session_start)) / 60)::BIGINT, \
             updated_at = now() \
         WHERE id = $1 AND session_end IS NULL \
         RETURNING total_duration",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
}

/// Total tracked minutes for sessions started in [from, to).
/// Open sessions count their elapsed time so far.
pub async fn total_minutes_between(
    pool: &PgPool,
    user_id: i64,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(COALESCE(total_duration, \
                FLOOR(EXTRACT(EPOCH FROM (now() - session_start)) / 60)::BIGINT)), 0)::BIGINT \
         FROM user_sessions \
         WHERE user_id = $1 AND session_start >= $2 AND session_start < $3",
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_one(pool)
    .await
}
