use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use workzenith::monitor::{Monitor, PgStore};
use workzenith::{auth, db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/workzenith".to_string());

    // Initialize database
    let pool = db::init_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    // Seed the default admin account if the database is empty
    let admin_hash = auth::password::hash_password("admin123")
        .expect("Failed to hash default password");
    db::seed_admin(&pool, &admin_hash)
        .await
        .expect("Failed to seed admin account");

    // Cookie signing key. Without a SESSION_KEY of 64+ bytes a random key is
    // used and sessions do not survive a restart.
    let session_key = match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!("SESSION_KEY too short ({} bytes, need 64+), using a random key", val.len());
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set, using a random key");
            Key::generate()
        }
    };

    let monitor = web::Data::new(Monitor::new(PgStore::new(pool.clone())));
    let limiter = auth::rate_limit::RateLimiter::new();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    log::info!("Starting server at http://{host}:{port}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            session_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(monitor.clone())
            .app_data(web::Data::new(limiter.clone()))
            // Static files
            .service(actix_files::Files::new("/static", "./static"))
            // Public routes
            .route("/login", web::get().to(handlers::auth_handlers::login_page))
            .route("/login", web::post().to(handlers::auth_handlers::login_submit))
            .route("/signup", web::get().to(handlers::auth_handlers::signup_page))
            .route("/signup", web::post().to(handlers::auth_handlers::signup_submit))
            // Root redirect
            .route("/", web::get().to(|| async {
                actix_web::HttpResponse::SeeOther()
                    .insert_header(("Location", "/dashboard"))
                    .finish()
            }))
            // Protected routes
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                    .route("/dashboard", web::get().to(handlers::dashboard_handlers::index))
                    .route("/logout", web::post().to(handlers::auth_handlers::logout))
                    // Tracking controls
                    .route("/tracking/start", web::post().to(handlers::tracking_handlers::start))
                    .route("/tracking/stop", web::post().to(handlers::tracking_handlers::stop))
                    .route("/tracking/status", web::post().to(handlers::tracking_handlers::update_status))
                    // Usage sample ingest (tracker client)
                    .route("/api/usage/app", web::post().to(handlers::tracking_handlers::ingest_app_sample))
                    .route("/api/usage/web", web::post().to(handlers::tracking_handlers::ingest_web_sample))
                    // Admin: team overview
                    .route("/team", web::get().to(handlers::team_handlers::index))
                    // Admin: real-time monitor
                    .route("/monitor", web::get().to(handlers::monitor_handlers::page))
                    .route("/monitor/start", web::post().to(handlers::monitor_handlers::start))
                    .route("/monitor/stop", web::post().to(handlers::monitor_handlers::stop))
                    .route("/monitor/refresh", web::post().to(handlers::monitor_handlers::refresh))
                    .route("/monitor/api/snapshot", web::get().to(handlers::monitor_handlers::api_snapshot))
                    .route("/monitor/ws", web::get().to(handlers::monitor_handlers::ws_connect)),
            )
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                let html = include_str!("../templates/errors/404.html");
                actix_web::HttpResponse::NotFound()
                    .content_type("text/html; charset=utf-8")
                    .body(html)
            }))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
