use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub const MIGRATIONS: &str = include_str!("schema.sql");

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@workzenith.local";

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(MIGRATIONS).execute(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Seed the default administrator account if the profiles table is empty.
pub async fn seed_admin(pool: &PgPool, admin_password_hash: &str) -> Result<(), sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(pool)
        .await?;
    if count > 0 {
        log::info!("Database already seeded ({count} profiles), skipping admin seed");
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO profiles (email, full_name, role, password_hash) \
         VALUES ($1, $2, 'admin', $3)",
    )
    .bind(DEFAULT_ADMIN_EMAIL)
    .bind("Administrator")
    .bind(admin_password_hash)
    .execute(pool)
    .await?;

    log::info!("Seeded default admin account ({DEFAULT_ADMIN_EMAIL})");
    Ok(())
}
