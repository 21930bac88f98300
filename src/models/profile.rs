use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

/// Employee profile as exposed to templates and the monitor — no password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Display name with the email as fallback, as the dashboard shows it.
    pub fn display_name(&self) -> &str {
        match &self.full_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}

/// Internal profile for authentication — includes password hash.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthProfile {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub password_hash: String,
}

/// New profile data for signup / provisioning.
pub struct NewProfile {
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub password_hash: String,
}

const SELECT_PROFILE: &str =
    "SELECT id, email, full_name, role, created_at FROM profiles";

/// All tracked employees (non-admin profiles), ordered by display name.
/// This is the monitor's subject listing.
pub async fn list_employees(pool: &PgPool) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        "{SELECT_PROFILE} WHERE role = $1 ORDER BY full_name ASC NULLS LAST, email ASC"
    ))
    .bind(ROLE_USER)
    .fetch_all(pool)
    .await
}

/// Every profile, newest first — the team overview roster.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!("{SELECT_PROFILE} ORDER BY created_at DESC"))
        .fetch_all(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!("{SELECT_PROFILE} WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find a profile by email for authentication. Returns the hash-bearing struct.
pub async fn find_for_auth(pool: &PgPool, email: &str) -> Result<Option<AuthProfile>, sqlx::Error> {
    sqlx::query_as::<_, AuthProfile>(
        "SELECT id, email, full_name, role, password_hash FROM profiles WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) > 0 FROM profiles WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await
}

pub async fn create(pool: &PgPool, new: &NewProfile) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO profiles (email, full_name, role, password_hash) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&new.email)
    .bind(&new.full_name)
    .bind(&new.role)
    .bind(&new.password_hash)
    .fetch_one(pool)
    .await
}
