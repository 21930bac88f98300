use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::auth::session::require_admin;
use crate::errors::{AppError, render};
use crate::models::activity;
use crate::templates_structs::{PageContext, TeamStats, TeamTemplate};

/// Admin team overview: stat tiles plus the full roster with each member's
/// latest reported status.
pub async fn index(pool: web::Data<PgPool>, session: Session) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let ctx = PageContext::build(&session)?;

    let members = activity::roster(&pool).await?;

    let day_ago = Utc::now() - Duration::hours(24);
    let stats = TeamStats {
        total_members: members.len() as i64,
        active_members: members
            .iter()
            .filter(|m| {
                m.current_activity
                    .as_ref()
                    .map(|a| a.status == "active")
                    .unwrap_or(false)
            })
            .count() as i64,
        admin_count: members.iter().filter(|m| m.profile.is_admin()).count() as i64,
        recent_activity: members
            .iter()
            .filter(|m| {
                m.current_activity
                    .as_ref()
                    .map(|a| a.updated_at > day_ago)
                    .unwrap_or(false)
            })
            .count() as i64,
    };

    let tmpl = TeamTemplate { ctx, stats, members };
    render(tmpl)
}
