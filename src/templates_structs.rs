use std::sync::Arc;

use actix_session::Session;
use askama::Template;

use crate::auth::csrf;
use crate::auth::session::{get_email, is_admin, take_flash};
use crate::errors::AppError;
use crate::models::activity::{StatusRecord, TeamMember};
use crate::models::productivity::ProductivityMetrics;
use crate::models::work_session::WorkSession;
use crate::monitor::{MonitorState, Snapshot};

pub const APP_NAME: &str = "Workzenith";

/// Common context shared by all authenticated pages.
/// Templates access these as `ctx.email`, `ctx.is_admin`, etc.
pub struct PageContext {
    pub email: String,
    pub avatar_initial: String,
    pub is_admin: bool,
    pub flash: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
}

impl PageContext {
    pub fn build(session: &Session) -> Result<Self, AppError> {
        let email = get_email(session)
            .map_err(|e| AppError::Session(format!("Failed to get email: {}", e)))?;
        let is_admin = is_admin(session);
        let flash = take_flash(session);
        let csrf_token = csrf::get_or_create_token(session);
        let avatar_initial = email.chars().next().unwrap_or('?').to_uppercase().to_string();
        Ok(Self {
            email,
            avatar_initial,
            is_admin,
            flash,
            app_name: APP_NAME.to_string(),
            csrf_token,
        })
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupTemplate {
    pub errors: Vec<String>,
    pub app_name: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub full_name: String,
    pub metrics: ProductivityMetrics,
    pub open_session: Option<WorkSession>,
    pub current_status: Option<StatusRecord>,
}

/// Aggregate tiles for the team overview page.
pub struct TeamStats {
    pub total_members: i64,
    pub active_members: i64,
    pub admin_count: i64,
    pub recent_activity: i64,
}

#[derive(Template)]
#[template(path = "team.html")]
pub struct TeamTemplate {
    pub ctx: PageContext,
    pub stats: TeamStats,
    pub members: Vec<TeamMember>,
}

#[derive(Template)]
#[template(path = "monitor.html")]
pub struct MonitorTemplate {
    pub ctx: PageContext,
    pub state: MonitorState,
    pub snapshot: Option<Arc<Snapshot>>,
}
