use std::future::Future;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::activity::{self, StatusRecord};
use crate::models::app_usage::{self, AppUsageSample};
use crate::models::profile::{self, Profile};
use crate::models::web_usage::{self, WebUsageSample};
use crate::models::work_session::{self, WorkSession};

/// The read contracts the monitor needs from the backing store: the subject
/// listing plus four per-subject point lookups. `PgStore` is the production
/// implementation; the monitor tests substitute an in-memory fake.
///
/// Absence (`Ok(None)`) is a normal outcome for every point lookup.
pub trait ActivityStore: Send + Sync + 'static {
    fn list_employees(&self) -> impl Future<Output = Result<Vec<Profile>, AppError>> + Send;

    fn open_session(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<WorkSession>, AppError>> + Send;

    fn latest_status(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<StatusRecord>, AppError>> + Send;

    fn latest_app_sample_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<AppUsageSample>, AppError>> + Send;

    fn latest_web_sample_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<WebUsageSample>, AppError>> + Send;
}

/// Postgres-backed store, delegating to the model queries.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ActivityStore for PgStore {
    async fn list_employees(&self) -> Result<Vec<Profile>, AppError> {
        Ok(profile::list_employees(&self.pool).await?)
    }

    async fn open_session(&self, user_id: i64) -> Result<Option<WorkSession>, AppError> {
        Ok(work_session::find_open(&self.pool, user_id).await?)
    }

    async fn latest_status(&self, user_id: i64) -> Result<Option<StatusRecord>, AppError> {
        Ok(activity::latest_for_user(&self.pool, user_id).await?)
    }

    async fn latest_app_sample_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Option<AppUsageSample>, AppError> {
        Ok(app_usage::latest_since(&self.pool, user_id, since).await?)
    }

    async fn latest_web_sample_since(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Option<WebUsageSample>, AppError> {
        Ok(web_usage::latest_since(&self.pool, user_id, since).await?)
    }
}
