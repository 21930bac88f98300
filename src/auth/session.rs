use actix_session::Session;
use crate::errors::AppError;

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

pub fn get_email(session: &Session) -> Result<String, String> {
    match session.get::<String>("email") {
        Ok(Some(email)) => Ok(email),
        Ok(None) => Err("No email in session".to_string()),
        Err(e) => Err(format!("Session error: {}", e)),
    }
}

pub fn is_admin(session: &Session) -> bool {
    session
        .get::<String>("role")
        .unwrap_or(None)
        .map(|r| r == "admin")
        .unwrap_or(false)
}

pub fn take_flash(session: &Session) -> Option<String> {
    let flash = session.get::<String>("flash").unwrap_or(None);
    if flash.is_some() {
        session.remove("flash");
    }
    flash
}

/// Require the administrator role; returns Err(AppError) if denied.
pub fn require_admin(session: &Session) -> Result<(), AppError> {
    if is_admin(session) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// Current user id, or a session error if not logged in.
pub fn require_user_id(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or_else(|| AppError::Session("User not logged in".to_string()))
}
