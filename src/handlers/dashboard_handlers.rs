use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::session::{is_admin, require_user_id};
use crate::errors::{AppError, render};
use crate::models::{activity, productivity, profile, work_session};
use crate::templates_structs::{DashboardTemplate, PageContext};

/// The signed-in employee's own dashboard. Administrators land on the team
/// overview instead.
pub async fn index(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    if is_admin(&session) {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/team"))
            .finish());
    }

    let user_id = require_user_id(&session)?;
    let ctx = PageContext::build(&session)?;

    let me = profile::find_by_id(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let metrics = productivity::metrics_for_user(&pool, user_id, Utc::now()).await?;
    let open_session = work_session::find_open(&pool, user_id).await?;
    let current_status = activity::latest_for_user(&pool, user_id).await?;

    let tmpl = DashboardTemplate {
        ctx,
        full_name: me.display_name().to_string(),
        metrics,
        open_session,
        current_status,
    };
    render(tmpl)
}
