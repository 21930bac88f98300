use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::{csrf, password, validate};
use crate::errors::{AppError, render};
use crate::models::profile::{self, NewProfile, ROLE_ADMIN, ROLE_USER};
use crate::templates_structs::{APP_NAME, LoginTemplate, SignupTemplate};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct CsrfOnly {
    pub csrf_token: String,
}

pub async fn login_page(session: Session) -> Result<HttpResponse, AppError> {
    // If already logged in, redirect to dashboard
    if session.get::<i64>("user_id").unwrap_or(None).is_some() {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/dashboard"))
            .finish());
    }

    let csrf_token = csrf::get_or_create_token(&session);
    let tmpl = LoginTemplate {
        error: None,
        app_name: APP_NAME.to_string(),
        csrf_token,
    };
    render(tmpl)
}

pub async fn login_submit(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<LoginForm>,
    limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    // Rate-limit check BEFORE any database access
    let ip = req
        .peer_addr()
        .map(|addr| addr.ip())
        .unwrap_or_else(|| std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED));

    if limiter.is_blocked(ip) {
        let csrf_token = csrf::get_or_create_token(&session);
        let tmpl = LoginTemplate {
            error: Some("Too many failed login attempts. Please try again later.".to_string()),
            app_name: APP_NAME.to_string(),
            csrf_token,
        };
        return render(tmpl);
    }

    let found = profile::find_for_auth(&pool, form.email.trim()).await?;

    match found {
        Some(p) if password::verify_password(&form.password, &p.password_hash) => {
            limiter.clear(ip);

            let _ = session.insert("user_id", p.id);
            let _ = session.insert("email", &p.email);
            let _ = session.insert("role", &p.role);
            Ok(HttpResponse::SeeOther()
                .insert_header(("Location", "/dashboard"))
                .finish())
        }
        _ => {
            limiter.record_failure(ip);
            let csrf_token = csrf::get_or_create_token(&session);
            let tmpl = LoginTemplate {
                error: Some("Invalid email or password".to_string()),
                app_name: APP_NAME.to_string(),
                csrf_token,
            };
            render(tmpl)
        }
    }
}

pub async fn signup_page(session: Session) -> Result<HttpResponse, AppError> {
    if session.get::<i64>("user_id").unwrap_or(None).is_some() {
        return Ok(HttpResponse::SeeOther()
            .insert_header(("Location", "/dashboard"))
            .finish());
    }

    let csrf_token = csrf::get_or_create_token(&session);
    let tmpl = SignupTemplate {
        errors: vec![],
        app_name: APP_NAME.to_string(),
        csrf_token,
    };
    render(tmpl)
}

pub async fn signup_submit(
    pool: web::Data<PgPool>,
    session: Session,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;

    let mut errors: Vec<String> = vec![];
    errors.extend(validate::validate_email(&form.email));
    errors.extend(validate::validate_password(&form.password));
    errors.extend(validate::validate_full_name(&form.full_name));

    let role = if form.role == ROLE_ADMIN { ROLE_ADMIN } else { ROLE_USER };

    if errors.is_empty() && profile::email_exists(&pool, form.email.trim()).await? {
        errors.push("An account with this email already exists".to_string());
    }

    if !errors.is_empty() {
        let csrf_token = csrf::get_or_create_token(&session);
        let tmpl = SignupTemplate {
            errors,
            app_name: APP_NAME.to_string(),
            csrf_token,
        };
        return render(tmpl);
    }

    let password_hash = password::hash_password(&form.password).map_err(AppError::Hash)?;
    let full_name = {
        let trimmed = form.full_name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    };

    let new = NewProfile {
        email: form.email.trim().to_string(),
        full_name,
        role: role.to_string(),
        password_hash,
    };
    let user_id = profile::create(&pool, &new).await?;

    let _ = session.insert("user_id", user_id);
    let _ = session.insert("email", &new.email);
    let _ = session.insert("role", role);
    let _ = session.insert("flash", "Welcome! Your account has been created");

    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/dashboard"))
        .finish())
}

pub async fn logout(
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    csrf::validate_csrf(&session, &form.csrf_token)?;
    session.purge();
    Ok(HttpResponse::SeeOther()
        .insert_header(("Location", "/login"))
        .finish())
}
