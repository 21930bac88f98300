//! Tests for the productivity metric arithmetic: score ratios, usage
//! breakdown percentages, and the weekly chart series.

use chrono::NaiveDate;

use workzenith::models::productivity::{
    DailyProductivity, UsageTotal, breakdown, score, weekly_series,
};

fn total(name: &str, minutes: i64, is_productive: bool) -> UsageTotal {
    UsageTotal {
        name: name.to_string(),
        minutes,
        is_productive,
    }
}

fn day(date: NaiveDate, active: i64, productive: i64, idle: i64) -> DailyProductivity {
    DailyProductivity {
        user_id: 1,
        date,
        total_active_time: active,
        productive_time: productive,
        idle_time: idle,
        productivity_score: None,
        total_applications: 0,
        total_websites: 0,
    }
}

#[test]
fn test_score_ratio() {
    // 356 productive minutes out of 445 active is an 80% day.
    assert_eq!(score(356, 445), 80);
    assert_eq!(score(0, 445), 0);
    assert_eq!(score(445, 445), 100);
}

#[test]
fn test_score_with_nothing_tracked() {
    assert_eq!(score(0, 0), 0);
    assert_eq!(score(10, 0), 0);
    assert_eq!(score(10, -5), 0);
}

#[test]
fn test_score_rounds() {
    assert_eq!(score(1, 3), 33);
    assert_eq!(score(2, 3), 67);
}

#[test]
fn test_breakdown_percentages() {
    let totals = vec![
        total("Visual Studio Code", 145, true),
        total("Chrome", 98, true),
        total("Spotify", 45, false),
    ];
    let entries = breakdown(&totals);

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].name, "Visual Studio Code");
    assert_eq!(entries[0].percentage, 50); // 145 / 288
    assert_eq!(entries[1].percentage, 34);
    assert_eq!(entries[2].percentage, 16);
    assert!(!entries[2].is_productive);

    // Order is the query's order (biggest first), untouched.
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Visual Studio Code", "Chrome", "Spotify"]);
}

#[test]
fn test_breakdown_of_nothing() {
    assert!(breakdown(&[]).is_empty());

    // All-zero minutes must not divide by zero.
    let entries = breakdown(&[total("Idle App", 0, false)]);
    assert_eq!(entries[0].percentage, 0);
}

#[test]
fn test_weekly_series_zero_fills_missing_days() {
    let d1 = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(); // a Monday
    let d2 = NaiveDate::from_ymd_opt(2026, 3, 3).unwrap();
    let d3 = NaiveDate::from_ymd_opt(2026, 3, 4).unwrap();
    let dates = vec![d1, d2, d3];

    // Only Tuesday has a rollup row: 90 productive + 30 idle minutes.
    let rollups = vec![day(d2, 120, 90, 30)];
    let series = weekly_series(&dates, &rollups);

    assert_eq!(series.len(), 3);
    assert_eq!(series[0].name, "Mon");
    assert_eq!(series[0].productive, 0.0);
    assert_eq!(series[0].offline, 24.0);

    assert_eq!(series[1].name, "Tue");
    assert_eq!(series[1].productive, 1.5);
    assert_eq!(series[1].idle, 0.5);
    assert_eq!(series[1].offline, 22.0);

    assert_eq!(series[2].name, "Wed");
    assert_eq!(series[2].productive, 0.0);
}

#[test]
fn test_weekly_series_day_adds_up_to_24_hours() {
    let d = NaiveDate::from_ymd_opt(2026, 3, 6).unwrap();
    let series = weekly_series(&[d], &[day(d, 445, 356, 89)]);

    let entry = &series[0];
    assert!((entry.productive + entry.idle + entry.offline - 24.0).abs() < 0.2);
}
