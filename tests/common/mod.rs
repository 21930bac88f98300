//! Shared test infrastructure for the database-backed tests.
//!
//! These helpers connect to a live Postgres named by `DATABASE_URL`, so the
//! tests that use them are `#[ignore]`d by default. Run them with:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/workzenith_test cargo test -- --ignored
//! ```

use sqlx::PgPool;

use workzenith::db;

pub const TEST_PASSWORD: &str = "password123";

/// Connect to the test database and apply the schema.
pub async fn setup_test_db() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/workzenith_test".to_string());
    let pool = db::init_pool(&url).await.expect("Failed to connect to test DB");
    db::run_migrations(&pool).await.expect("Failed to run migrations");
    pool
}

/// Unique-ish email per test so reruns against the same database don't
/// collide on the profiles unique constraint.
pub fn test_email(prefix: &str) -> String {
    format!("{}_{}@test.com", prefix, std::process::id())
}
