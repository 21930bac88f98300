//! Behavior tests for the activity monitor, run against an in-memory store.
//!
//! Covers: snapshot merging, cardinality under lookup failures, the trailing
//! sample window, start/stop lifecycle with simulated time, and the
//! overlapping-refresh guard.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Semaphore;

use workzenith::errors::AppError;
use workzenith::models::activity::StatusRecord;
use workzenith::models::app_usage::AppUsageSample;
use workzenith::models::profile::Profile;
use workzenith::models::web_usage::WebUsageSample;
use workzenith::models::work_session::WorkSession;
use workzenith::monitor::{ActivityStore, Monitor, MonitorError, MonitorState};

/// In-memory store. The sample lookups deliberately ignore `since` so the
/// tests exercise the monitor's own window check.
#[derive(Default)]
struct FakeStore {
    profiles: Vec<Profile>,
    sessions: HashMap<i64, WorkSession>,
    statuses: HashMap<i64, StatusRecord>,
    app_samples: HashMap<i64, AppUsageSample>,
    web_samples: HashMap<i64, WebUsageSample>,
    fail_listing: Arc<AtomicBool>,
    fail_status_for: Option<i64>,
    list_calls: Arc<AtomicUsize>,
    listing_gate: Option<Arc<Semaphore>>,
}

impl ActivityStore for FakeStore {
    async fn list_employees(&self) -> Result<Vec<Profile>, AppError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.listing_gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(self.profiles.clone())
    }

    async fn open_session(&self, user_id: i64) -> Result<Option<WorkSession>, AppError> {
        Ok(self.sessions.get(&user_id).cloned())
    }

    async fn latest_status(&self, user_id: i64) -> Result<Option<StatusRecord>, AppError> {
        if self.fail_status_for == Some(user_id) {
            return Err(AppError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(self.statuses.get(&user_id).cloned())
    }

    async fn latest_app_sample_since(
        &self,
        user_id: i64,
        _since: DateTime<Utc>,
    ) -> Result<Option<AppUsageSample>, AppError> {
        Ok(self.app_samples.get(&user_id).cloned())
    }

    async fn latest_web_sample_since(
        &self,
        user_id: i64,
        _since: DateTime<Utc>,
    ) -> Result<Option<WebUsageSample>, AppError> {
        Ok(self.web_samples.get(&user_id).cloned())
    }
}

fn profile(id: i64, email: &str, name: &str) -> Profile {
    Profile {
        id,
        email: email.to_string(),
        full_name: Some(name.to_string()),
        role: "user".to_string(),
        created_at: Utc::now(),
    }
}

fn open_session(user_id: i64, minutes_ago: i64) -> WorkSession {
    WorkSession {
        id: user_id * 100,
        user_id,
        session_start: Utc::now() - Duration::minutes(minutes_ago),
        session_end: None,
        total_duration: None,
    }
}

fn status(user_id: i64, value: &str) -> StatusRecord {
    StatusRecord {
        id: user_id * 200,
        user_id,
        activity_type: "work".to_string(),
        description: None,
        status: value.to_string(),
        updated_at: Utc::now(),
    }
}

fn app_sample(user_id: i64, name: &str, minutes_ago: i64) -> AppUsageSample {
    AppUsageSample {
        id: user_id * 300,
        user_id,
        session_id: None,
        application_name: name.to_string(),
        window_title: None,
        is_productive: true,
        start_time: Utc::now() - Duration::minutes(minutes_ago),
        duration: Some(2),
    }
}

fn web_sample(user_id: i64, domain: &str, minutes_ago: i64) -> WebUsageSample {
    WebUsageSample {
        id: user_id * 400,
        user_id,
        session_id: None,
        domain: domain.to_string(),
        url: None,
        title: None,
        is_productive: true,
        start_time: Utc::now() - Duration::minutes(minutes_ago),
        duration: Some(2),
    }
}

#[tokio::test]
async fn test_refresh_merges_live_state() {
    // A is online with a recent app sample; B is offline on a break.
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice"), profile(2, "b@test.com", "Bob")],
        sessions: HashMap::from([(1, open_session(1, 45))]),
        statuses: HashMap::from([(1, status(1, "active")), (2, status(2, "break"))]),
        app_samples: HashMap::from([(1, app_sample(1, "Visual Studio Code", 2))]),
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    let snapshot = monitor.refresh().await.expect("refresh failed");
    assert_eq!(snapshot.employees.len(), 2);

    let a = &snapshot.employees[0];
    assert_eq!(a.email, "a@test.com");
    assert!(a.is_online);
    assert!(a.current_session.is_some());
    assert_eq!(a.status_label(), "active");
    assert_eq!(
        a.recent_app_usage.as_ref().map(|s| s.application_name.as_str()),
        Some("Visual Studio Code")
    );

    let b = &snapshot.employees[1];
    assert!(!b.is_online);
    assert!(b.recent_app_usage.is_none());
    assert_eq!(b.current_status.as_ref().map(|s| s.status.as_str()), Some("break"));
    assert_eq!(b.status_label(), "offline");
}

#[tokio::test]
async fn test_refresh_preserves_listing_order() {
    let store = FakeStore {
        profiles: vec![
            profile(3, "carol@test.com", "Carol"),
            profile(1, "alice@test.com", "Alice"),
            profile(2, "bob@test.com", "Bob"),
        ],
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    let snapshot = monitor.refresh().await.expect("refresh failed");
    let emails: Vec<&str> = snapshot.employees.iter().map(|e| e.email.as_str()).collect();
    assert_eq!(emails, vec!["carol@test.com", "alice@test.com", "bob@test.com"]);
}

#[tokio::test]
async fn test_lookup_failure_keeps_subject_in_snapshot() {
    // Bob's status lookup fails; he must still appear, with status absent
    // and his other lookups intact.
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice"), profile(2, "b@test.com", "Bob")],
        sessions: HashMap::from([(2, open_session(2, 10))]),
        statuses: HashMap::from([(1, status(1, "active"))]),
        fail_status_for: Some(2),
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    let snapshot = monitor.refresh().await.expect("refresh failed");
    assert_eq!(snapshot.employees.len(), 2);

    let bob = &snapshot.employees[1];
    assert_eq!(bob.email, "b@test.com");
    assert!(bob.current_status.is_none());
    assert!(bob.is_online, "unrelated lookups must survive the failure");
}

#[tokio::test]
async fn test_stale_samples_never_surface() {
    // The store returns a 10-minute-old sample; the monitor's 5-minute
    // window must drop it.
    let store = FakeStore {
        profiles: vec![profile(1, "c@test.com", "Cleo")],
        app_samples: HashMap::from([(1, app_sample(1, "Slack", 10))]),
        web_samples: HashMap::from([(1, web_sample(1, "github.com", 10))]),
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    let snapshot = monitor.refresh().await.expect("refresh failed");
    let c = &snapshot.employees[0];
    assert!(c.recent_app_usage.is_none());
    assert!(c.recent_web_usage.is_none());
}

#[tokio::test]
async fn test_in_window_samples_surface() {
    let store = FakeStore {
        profiles: vec![profile(1, "c@test.com", "Cleo")],
        app_samples: HashMap::from([(1, app_sample(1, "Slack", 2))]),
        web_samples: HashMap::from([(1, web_sample(1, "github.com", 4))]),
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    let snapshot = monitor.refresh().await.expect("refresh failed");
    let c = &snapshot.employees[0];
    assert!(c.recent_app_usage.is_some());
    assert!(c.recent_web_usage.is_some());
}

#[tokio::test]
async fn test_listing_failure_keeps_previous_snapshot() {
    let fail_listing = Arc::new(AtomicBool::new(false));
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice")],
        fail_listing: Arc::clone(&fail_listing),
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    let first = monitor.refresh().await.expect("first refresh failed");

    fail_listing.store(true, Ordering::SeqCst);
    let err = monitor.refresh().await.expect_err("listing failure must abort the tick");
    assert!(matches!(err, MonitorError::Listing(_)));

    let current = monitor.snapshot().expect("previous snapshot must remain");
    assert!(Arc::ptr_eq(&first, &current));
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice")],
        list_calls: Arc::clone(&list_calls),
        ..Default::default()
    };
    let monitor = Monitor::new(store);
    assert_eq!(monitor.state(), MonitorState::Idle);

    let interval = StdDuration::from_secs(30);
    monitor.start(interval);
    monitor.start(interval); // second start must not add a schedule
    assert_eq!(monitor.state(), MonitorState::Monitoring);

    // Immediate refresh on start.
    tokio::time::sleep(StdDuration::from_secs(1)).await;
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);

    // Three intervals later: exactly three more refreshes, not six.
    tokio::time::sleep(StdDuration::from_secs(90)).await;
    assert_eq!(list_calls.load(Ordering::SeqCst), 4);

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_refreshes() {
    let list_calls = Arc::new(AtomicUsize::new(0));
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice")],
        list_calls: Arc::clone(&list_calls),
        ..Default::default()
    };
    let monitor = Monitor::new(store);

    monitor.start(StdDuration::from_secs(30));
    tokio::time::sleep(StdDuration::from_secs(1)).await;
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);

    monitor.stop();
    assert_eq!(monitor.state(), MonitorState::Idle);

    // Several intervals pass; no further refreshes fire.
    tokio::time::sleep(StdDuration::from_secs(150)).await;
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);

    // Stopping again while idle is a no-op.
    monitor.stop();
    assert_eq!(monitor.state(), MonitorState::Idle);
}

#[tokio::test]
async fn test_overlapping_refresh_is_rejected() {
    let gate = Arc::new(Semaphore::new(0));
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice")],
        listing_gate: Some(Arc::clone(&gate)),
        ..Default::default()
    };
    let monitor = Arc::new(Monitor::new(store));

    // First refresh parks inside the listing until the gate opens.
    let first = {
        let monitor = Arc::clone(&monitor);
        tokio::spawn(async move { monitor.refresh().await })
    };
    tokio::time::sleep(StdDuration::from_millis(50)).await;

    let second = monitor.refresh().await;
    assert!(matches!(second, Err(MonitorError::RefreshInFlight)));

    gate.add_permits(1);
    let first = first.await.expect("task panicked").expect("first refresh failed");
    assert_eq!(first.employees.len(), 1);

    // With the first one done, refreshing works again.
    gate.add_permits(1);
    monitor.refresh().await.expect("subsequent refresh failed");
}

#[tokio::test]
async fn test_refresh_publishes_to_subscribers() {
    let store = FakeStore {
        profiles: vec![profile(1, "a@test.com", "Alice")],
        ..Default::default()
    };
    let monitor = Monitor::new(store);
    let mut updates = monitor.subscribe();

    let published = monitor.refresh().await.expect("refresh failed");

    updates.changed().await.expect("publish not observed");
    let seen = updates.borrow_and_update().clone().expect("empty publish");
    assert!(Arc::ptr_eq(&published, &seen));
    assert!(Arc::ptr_eq(&published, &monitor.snapshot().expect("no snapshot")));
}
