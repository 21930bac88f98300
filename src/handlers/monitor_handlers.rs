use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;

use crate::auth::csrf;
use crate::auth::session::{is_admin, require_admin};
use crate::errors::{AppError, render};
use crate::monitor::{DEFAULT_POLL_INTERVAL, Monitor, MonitorError, PgStore};
use crate::templates_structs::{MonitorTemplate, PageContext};

use super::auth_handlers::CsrfOnly;

fn to_monitor() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", "/monitor"))
        .finish()
}

/// The real-time monitor page, rendered from the last published snapshot.
pub async fn page(
    monitor: web::Data<Monitor<PgStore>>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let ctx = PageContext::build(&session)?;

    let tmpl = MonitorTemplate {
        ctx,
        state: monitor.state(),
        snapshot: monitor.snapshot(),
    };
    render(tmpl)
}

pub async fn start(
    monitor: web::Data<Monitor<PgStore>>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    monitor.start(DEFAULT_POLL_INTERVAL);
    let _ = session.insert("flash", "Real-time employee activity monitoring is now active");
    Ok(to_monitor())
}

pub async fn stop(
    monitor: web::Data<Monitor<PgStore>>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    monitor.stop();
    let _ = session.insert("flash", "Real-time monitoring has been disabled");
    Ok(to_monitor())
}

/// One-off refresh from the page's Refresh button.
pub async fn refresh(
    monitor: web::Data<Monitor<PgStore>>,
    session: Session,
    form: web::Form<CsrfOnly>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    csrf::validate_csrf(&session, &form.csrf_token)?;

    match monitor.refresh().await {
        Ok(_) => {}
        Err(MonitorError::RefreshInFlight) => {
            let _ = session.insert("flash", "A refresh is already running");
        }
        Err(MonitorError::Listing(e)) => {
            log::error!("monitor refresh failed: {e}");
            let _ = session.insert("flash", "Failed to fetch employee activities");
        }
    }
    Ok(to_monitor())
}

/// Current monitor state and snapshot as JSON.
pub async fn api_snapshot(
    monitor: web::Data<Monitor<PgStore>>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;

    let snapshot = monitor.snapshot();
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "state": monitor.state(),
        "snapshot": snapshot.as_deref(),
    })))
}

/// WebSocket that pushes every published snapshot to the monitor page.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    monitor: web::Data<Monitor<PgStore>>,
) -> Result<HttpResponse, actix_web::Error> {
    if !is_admin(&session) {
        return Ok(HttpResponse::Forbidden().finish());
    }

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let mut updates = monitor.subscribe();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let payload = updates
                        .borrow_and_update()
                        .as_ref()
                        .map(|snapshot| serde_json::to_string(snapshot.as_ref()).unwrap_or_default());
                    if let Some(text) = payload {
                        if ws_session.text(text).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        Message::Text(_) => {
                            // Controls go through HTTP POST, not WS
                        }
                        _ => {}
                    }
                }
                else => break,
            }
        }
    });

    Ok(response)
}
