use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::csrf;
use crate::auth::session::require_user_id;
use crate::errors::AppError;
use crate::models::app_usage::{self, NewAppSample};
use crate::models::web_usage::{self, NewWebSample};
use crate::models::{activity, productivity, work_session};

use super::auth_handlers::CsrfOnly;

const STATUS_VALUES: [&str; 3] = ["active", "idle", "break"];

fn to_dashboard() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/dashboard"))
        .finish()
}

/// Begin a tracking session. If one is already open it is resumed, matching
/// the tracker's behavior after a reload.
pub async fn start(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user_id = require_user_id(&session)?;

    if work_session::find_open(&pool, user_id).await?.is_some() {
        let _ = session.insert("flash", "Active session found — continuing your existing work session");
        return Ok(to_dashboard());
    }

    work_session::start(&pool, user_id).await?;
    let _ = session.insert("flash", "Tracking started. Activities will be recorded until you stop.");
    Ok(to_dashboard())
}

pub async fn stop(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user_id = require_user_id(&session)?;

    let open = work_session::find_open(&pool, user_id).await?;
    match open {
        Some(s) => {
            let duration = work_session::end(&pool, s.id).await?.unwrap_or(0);
            productivity::refresh_daily(&pool, user_id, Utc::now()).await?;
            let _ = session.insert(
                "flash",
                format!(
                    "Work session ended. Total duration: {}h {}m",
                    duration / 60,
                    duration % 60
                ),
            );
        }
        None => {
            let _ = session.insert("flash", "No active session to stop");
        }
    }
    Ok(to_dashboard())
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub activity_type: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    pub csrf_token: String,
}

/// Record a new status (active/idle/break) with an activity note.
pub async fn update_status(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<StatusForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    let user_id = require_user_id(&session)?;

    if !STATUS_VALUES.contains(&form.status.as_str()) {
        let _ = session.insert("flash", "Unknown status value");
        return Ok(to_dashboard());
    }

    let description = {
        let trimmed = form.description.trim();
        if trimmed.is_empty() { None } else { Some(trimmed) }
    };
    activity::record(&pool, user_id, form.activity_type.trim(), description, &form.status).await?;

    let _ = session.insert("flash", "Status updated");
    Ok(to_dashboard())
}

#[derive(Deserialize)]
pub struct AppSamplePayload {
    pub application_name: String,
    #[serde(default)]
    pub window_title: Option<String>,
    #[serde(default)]
    pub is_productive: bool,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Ingest one application usage sample from the tracker client.
/// The sample is attached to the caller's open session when there is one.
pub async fn ingest_app_sample(
    pool: web::Data<PgPool>,
    session: Session,
    payload: web::Json<AppSamplePayload>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let open = work_session::find_open(&pool, user_id).await?;

    let id = app_usage::record(
        &pool,
        &NewAppSample {
            user_id,
            session_id: open.map(|s| s.id),
            application_name: payload.application_name.clone(),
            window_title: payload.window_title.clone(),
            is_productive: payload.is_productive,
            duration: payload.duration,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}

#[derive(Deserialize)]
pub struct WebSamplePayload {
    pub domain: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_productive: bool,
    #[serde(default)]
    pub duration: Option<i64>,
}

/// Ingest one website usage sample from the tracker client.
pub async fn ingest_web_sample(
    pool: web::Data<PgPool>,
    session: Session,
    payload: web::Json<WebSamplePayload>,
) -> Result<HttpResponse, AppError> {
    let user_id = require_user_id(&session)?;
    let open = work_session::find_open(&pool, user_id).await?;

    let id = web_usage::record(
        &pool,
        &NewWebSample {
            user_id,
            session_id: open.map(|s| s.id),
            domain: payload.domain.clone(),
            url: payload.url.clone(),
            title: payload.title.clone(),
            is_productive: payload.is_productive,
            duration: payload.duration,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "id": id })))
}
