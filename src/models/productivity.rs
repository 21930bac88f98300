use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::{app_usage, web_usage, work_session};

/// Per-name minute total as aggregated by the usage queries.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UsageTotal {
    pub name: String,
    pub minutes: i64,
    pub is_productive: bool,
}

/// A usage total with its share of the day, as the dashboard lists it.
#[derive(Debug, Clone, Serialize)]
pub struct UsageBreakdownEntry {
    pub name: String,
    pub minutes: i64,
    pub percentage: i64,
    pub is_productive: bool,
}

/// One row of the daily_productivity rollup table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyProductivity {
    pub user_id: i64,
    pub date: NaiveDate,
    pub total_active_time: i64,
    pub productive_time: i64,
    pub idle_time: i64,
    pub productivity_score: Option<f64>,
    pub total_applications: i64,
    pub total_websites: i64,
}

/// One weekday of the weekly chart, in hours.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyEntry {
    pub name: String,
    pub productive: f64,
    pub idle: f64,
    pub offline: f64,
}

/// Everything the user dashboard shows for one employee's day.
#[derive(Debug, Clone, Serialize)]
pub struct ProductivityMetrics {
    pub total_active_time: i64,
    pub productive_time: i64,
    pub idle_time: i64,
    pub productivity_score: i64,
    pub application_usage: Vec<UsageBreakdownEntry>,
    pub website_usage: Vec<UsageBreakdownEntry>,
    pub weekly: Vec<WeeklyEntry>,
}

// ---------- Computation ----------
//
// All of this is plain ratio arithmetic over rows the database already
// filtered; it stays in pure functions so the tests can cover it directly.

/// Productivity score as a whole percentage. Zero when nothing was tracked.
pub fn score(productive_minutes: i64, total_minutes: i64) -> i64 {
    if total_minutes <= 0 {
        return 0;
    }
    let ratio = productive_minutes as f64 / total_minutes as f64;
    (ratio * 100.0).round() as i64
}

/// Attach percentage-of-total to each usage total. Order is preserved.
pub fn breakdown(totals: &[UsageTotal]) -> Vec<UsageBreakdownEntry> {
    let sum: i64 = totals.iter().map(|t| t.minutes).sum();
    totals
        .iter()
        .map(|t| UsageBreakdownEntry {
            name: t.name.clone(),
            minutes: t.minutes,
            percentage: if sum > 0 {
                (t.minutes as f64 * 100.0 / sum as f64).round() as i64
            } else {
                0
            },
            is_productive: t.is_productive,
        })
        .collect()
}

/// Build the weekly chart series for the given dates (oldest first),
/// zero-filling days with no rollup row. Hours, one decimal.
pub fn weekly_series(dates: &[NaiveDate], days: &[DailyProductivity]) -> Vec<WeeklyEntry> {
    let to_hours = |minutes: i64| (minutes as f64 / 60.0 * 10.0).round() / 10.0;
    dates
        .iter()
        .map(|date| {
            let day = days.iter().find(|d| d.date == *date);
            let productive = day.map(|d| d.productive_time).unwrap_or(0);
            let idle = day.map(|d| d.idle_time).unwrap_or(0);
            let offline = (24 * 60 - productive - idle).max(0);
            WeeklyEntry {
                name: date.format("%a").to_string(),
                productive: to_hours(productive),
                idle: to_hours(idle),
                offline: to_hours(offline),
            }
        })
        .collect()
}

// ---------- Queries ----------

const SELECT_DAILY: &str = "SELECT user_id, date, total_active_time, productive_time, \
                            idle_time, productivity_score, total_applications, total_websites \
                            FROM daily_productivity";

pub async fn find_range(
    pool: &PgPool,
    user_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyProductivity>, sqlx::Error> {
    sqlx::query_as::<_, DailyProductivity>(&format!(
        "{SELECT_DAILY} WHERE user_id = $1 AND date >= $2 AND date <= $3 ORDER BY date"
    ))
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Write (or refresh) one day's rollup row.
pub async fn upsert_daily(
    pool: &PgPool,
    user_id: i64,
    date: NaiveDate,
    total_active_time: i64,
    productive_time: i64,
    idle_time: i64,
    total_applications: i64,
    total_websites: i64,
) -> Result<(), sqlx::Error> {
    let day_score = score(productive_time, total_active_time) as f64;
    sqlx::query(
        "INSERT INTO daily_productivity \
         (user_id, date, total_active_time, productive_time, idle_time, \
          productivity_score, total_applications, total_websites) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (user_id, date) DO UPDATE SET \
             total_active_time = EXCLUDED.total_active_time, \
             productive_time = EXCLUDED.productive_time, \
             idle_time = EXCLUDED.idle_time, \
             productivity_score = EXCLUDED.productivity_score, \
             total_applications = EXCLUDED.total_applications, \
             total_websites = EXCLUDED.total_websites, \
             updated_at = now()",
    )
    .bind(user_id)
    .bind(date)
    .bind(total_active_time)
    .bind(productive_time)
    .bind(idle_time)
    .bind(day_score)
    .bind(total_applications)
    .bind(total_websites)
    .execute(pool)
    .await?;
    Ok(())
}

/// Assemble the dashboard metrics for one user's current day.
pub async fn metrics_for_user(
    pool: &PgPool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<ProductivityMetrics, sqlx::Error> {
    let today = now.date_naive();
    let day_start = today.and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start + Duration::days(1);

    let total_active_time =
        work_session::total_minutes_between(pool, user_id, day_start, day_end).await?;
    let app_totals = app_usage::totals_between(pool, user_id, day_start, day_end).await?;
    let web_totals = web_usage::totals_between(pool, user_id, day_start, day_end).await?;

    let productive_sampled: i64 = app_totals
        .iter()
        .filter(|t| t.is_productive)
        .map(|t| t.minutes)
        .sum();
    let productive_time = productive_sampled.min(total_active_time);
    let idle_time = total_active_time - productive_time;

    let week_dates: Vec<NaiveDate> = (0..7).rev().map(|i| today - Duration::days(i)).collect();
    let rollups = find_range(pool, user_id, week_dates[0], today).await?;

    Ok(ProductivityMetrics {
        total_active_time,
        productive_time,
        idle_time,
        productivity_score: score(productive_time, total_active_time),
        application_usage: breakdown(&app_totals),
        website_usage: breakdown(&web_totals),
        weekly: weekly_series(&week_dates, &rollups),
    })
}

/// Refresh today's rollup row from the live tables. Called when a tracking
/// session closes so the weekly chart stays current.
pub async fn refresh_daily(
    pool: &PgPool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let today = now.date_naive();
    let day_start = today.and_time(NaiveTime::MIN).and_utc();
    let day_end = day_start + Duration::days(1);

    let total_active =
        work_session::total_minutes_between(pool, user_id, day_start, day_end).await?;
    let app_totals = app_usage::totals_between(pool, user_id, day_start, day_end).await?;
    let web_totals = web_usage::totals_between(pool, user_id, day_start, day_end).await?;

    let productive_sampled: i64 = app_totals
        .iter()
        .filter(|t| t.is_productive)
        .map(|t| t.minutes)
        .sum();
    let productive = productive_sampled.min(total_active);

    upsert_daily(
        pool,
        user_id,
        today,
        total_active,
        productive,
        total_active - productive,
        app_totals.len() as i64,
        web_totals.len() as i64,
    )
    .await
}
