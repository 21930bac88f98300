use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

/// A status record from the team_activities table: what an employee reports
/// themselves as doing, with an active/idle/break status value.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StatusRecord {
    pub id: i64,
    pub user_id: i64,
    pub activity_type: String,
    pub description: Option<String>,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

const SELECT_STATUS: &str =
    "SELECT id, user_id, activity_type, description, status, updated_at FROM team_activities";

/// The single most recently updated status record for a user.
pub async fn latest_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<StatusRecord>, sqlx::Error> {
    sqlx::query_as::<_, StatusRecord>(&format!(
        "{SELECT_STATUS} WHERE user_id = $1 ORDER BY updated_at DESC, id DESC LIMIT 1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn record(
    pool: &PgPool,
    user_id: i64,
    activity_type: &str,
    description: Option<&str>,
    status: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO team_activities (user_id, activity_type, description, status) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(user_id)
    .bind(activity_type)
    .bind(description)
    .bind(status)
    .fetch_one(pool)
    .await
}

/// A roster entry for the team overview: profile plus latest status record.
#[derive(Debug, Clone)]
pub struct TeamMember {
    pub profile: crate::models::profile::Profile,
    pub current_activity: Option<StatusRecord>,
}

/// Every profile with its most recent status record, newest profile first.
pub async fn roster(pool: &PgPool) -> Result<Vec<TeamMember>, sqlx::Error> {
    let profiles = crate::models::profile::list_all(pool).await?;
    let mut members = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let current_activity = latest_for_user(pool, profile.id).await?;
        members.push(TeamMember {
            profile,
            current_activity,
        });
    }
    Ok(members)
}
