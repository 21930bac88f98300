use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::errors::AppError;
use crate::models::activity::StatusRecord;
use crate::models::app_usage::AppUsageSample;
use crate::models::profile::Profile;
use crate::models::web_usage::WebUsageSample;
use crate::models::work_session::WorkSession;

use super::store::ActivityStore;

/// How often a running monitor refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// How far back an app/web usage sample may start and still count as current.
pub const RECENT_SAMPLE_WINDOW_SECS: i64 = 300;

/// One employee's merged live state for a single refresh.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeSnapshot {
    pub user_id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_online: bool,
    pub current_session: Option<WorkSession>,
    pub current_status: Option<StatusRecord>,
    pub recent_app_usage: Option<AppUsageSample>,
    pub recent_web_usage: Option<WebUsageSample>,
}

impl EmployeeSnapshot {
    /// A view with every lookup absent. Used when an employee's fetch task
    /// dies so the subject still appears in the snapshot.
    fn from_profile(profile: Profile) -> Self {
        Self {
            user_id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            is_online: false,
            current_session: None,
            current_status: None,
            recent_app_usage: None,
            recent_web_usage: None,
        }
    }

    pub fn display_name(&self) -> &str {
        match &self.full_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }

    /// Status badge text as the monitor page shows it.
    pub fn status_label(&self) -> &str {
        if !self.is_online {
            return "offline";
        }
        match &self.current_status {
            Some(s) => match s.status.as_str() {
                "active" => "active",
                "idle" => "idle",
                "break" => "break",
                _ => "unknown",
            },
            None => "no activity",
        }
    }
}

/// The complete published collection for one refresh, replaced wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub employees: Vec<EmployeeSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Monitoring,
}

impl MonitorState {
    pub fn is_monitoring(&self) -> bool {
        matches!(self, MonitorState::Monitoring)
    }
}

#[derive(Debug)]
pub enum MonitorError {
    /// The subject listing itself failed; the previous snapshot stands.
    Listing(AppError),
    /// Another refresh is in flight; this one was skipped.
    RefreshInFlight,
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::Listing(e) => write!(f, "employee listing failed: {e}"),
            MonitorError::RefreshInFlight => write!(f, "a refresh is already in flight"),
        }
    }
}

struct Runner {
    state: MonitorState,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

/// The pieces the polling task shares with the facade.
struct Inner<S> {
    store: Arc<S>,
    refreshing: AtomicBool,
    published: watch::Sender<Option<Arc<Snapshot>>>,
}

/// Periodically assembles a live snapshot of every tracked employee.
///
/// The monitor owns its timer task and the published snapshot; consumers
/// read via [`Monitor::snapshot`] or subscribe to publishes via
/// [`Monitor::subscribe`].
pub struct Monitor<S> {
    inner: Arc<Inner<S>>,
    runner: Mutex<Runner>,
}

impl<S: ActivityStore> Monitor<S> {
    pub fn new(store: S) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                store: Arc::new(store),
                refreshing: AtomicBool::new(false),
                published,
            }),
            runner: Mutex::new(Runner {
                state: MonitorState::Idle,
                shutdown: None,
                task: None,
            }),
        }
    }

    pub fn state(&self) -> MonitorState {
        self.runner.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// The most recently published snapshot, if any refresh has completed.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.published.borrow().clone()
    }

    /// Receiver that observes every publish. Used by the websocket push path.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.published.subscribe()
    }

    /// Fetch all employees' live state and publish a new snapshot.
    ///
    /// At most one refresh runs at a time; a call that finds another in
    /// flight returns [`MonitorError::RefreshInFlight`] without touching
    /// the published snapshot.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, MonitorError> {
        self.inner.refresh().await
    }

    /// Refresh immediately, then keep refreshing every `interval` until
    /// [`Monitor::stop`]. Calling start while running is a no-op.
    pub fn start(&self, interval: Duration) {
        let mut runner = self.runner.lock().unwrap_or_else(|e| e.into_inner());
        if runner.state == MonitorState::Monitoring {
            log::debug!("monitor already running, start ignored");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => match inner.refresh().await {
                        Ok(snapshot) => {
                            log::debug!("monitor refreshed {} employees", snapshot.employees.len());
                        }
                        Err(MonitorError::RefreshInFlight) => {
                            log::debug!("monitor tick skipped, refresh already in flight");
                        }
                        Err(MonitorError::Listing(e)) => {
                            log::error!("monitor refresh failed: {e}");
                        }
                    },
                    _ = shutdown_rx.changed() => break,
                }
            }
        });

        runner.state = MonitorState::Monitoring;
        runner.shutdown = Some(shutdown_tx);
        runner.task = Some(task);
        log::info!("monitor started (interval {interval:?})");
    }

    /// Cancel the repeating schedule. Safe to call when idle. A refresh
    /// already in flight completes and publishes once; no tick fires after.
    pub fn stop(&self) {
        let mut runner = self.runner.lock().unwrap_or_else(|e| e.into_inner());
        if runner.state == MonitorState::Idle {
            return;
        }
        if let Some(shutdown) = runner.shutdown.take() {
            let _ = shutdown.send(true);
        }
        // Detach rather than abort: an in-flight refresh may complete and
        // publish once before the loop sees the shutdown signal.
        if let Some(task) = runner.task.take() {
            drop(task);
        }
        runner.state = MonitorState::Idle;
        log::info!("monitor stopped");
    }
}

impl<S: ActivityStore> Inner<S> {
    async fn refresh(&self) -> Result<Arc<Snapshot>, MonitorError> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(MonitorError::RefreshInFlight);
        }
        let result = self.refresh_inner().await;
        self.refreshing.store(false, Ordering::Release);
        result
    }

    async fn refresh_inner(&self) -> Result<Arc<Snapshot>, MonitorError> {
        let taken_at = Utc::now();
        let since = taken_at - chrono::Duration::seconds(RECENT_SAMPLE_WINDOW_SECS);

        let profiles = self
            .store
            .list_employees()
            .await
            .map_err(MonitorError::Listing)?;

        // Fan out one task per employee; each runs its four point lookups
        // concurrently. The snapshot keeps one entry per listed profile no
        // matter how the lookups went.
        let mut handles = Vec::with_capacity(profiles.len());
        for profile in &profiles {
            let store = Arc::clone(&self.store);
            let profile = profile.clone();
            handles.push(tokio::spawn(async move {
                fetch_employee(&*store, profile, since).await
            }));
        }

        let mut employees = Vec::with_capacity(profiles.len());
        for (handle, profile) in handles.into_iter().zip(profiles) {
            match handle.await {
                Ok(view) => employees.push(view),
                Err(e) => {
                    log::error!("monitor: lookup task for {} died: {e}", profile.email);
                    employees.push(EmployeeSnapshot::from_profile(profile));
                }
            }
        }

        let snapshot = Arc::new(Snapshot { taken_at, employees });
        self.published.send_replace(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}

async fn fetch_employee<S: ActivityStore>(
    store: &S,
    profile: Profile,
    since: DateTime<Utc>,
) -> EmployeeSnapshot {
    let user_id = profile.id;
    let (session, status, app, web) = tokio::join!(
        store.open_session(user_id),
        store.latest_status(user_id),
        store.latest_app_sample_since(user_id, since),
        store.latest_web_sample_since(user_id, since),
    );

    let session = lookup_or_absent("open session", &profile.email, session);
    let status = lookup_or_absent("status", &profile.email, status);
    // Samples outside the trailing window never surface, even if the store
    // returned them.
    let app = lookup_or_absent("app usage", &profile.email, app).filter(|s| s.start_time >= since);
    let web = lookup_or_absent("web usage", &profile.email, web).filter(|s| s.start_time >= since);

    EmployeeSnapshot {
        user_id: profile.id,
        email: profile.email,
        full_name: profile.full_name,
        is_online: session.is_some(),
        current_session: session,
        current_status: status,
        recent_app_usage: app,
        recent_web_usage: web,
    }
}

/// A failed point lookup degrades to absent; the employee stays in the
/// snapshot.
fn lookup_or_absent<T>(
    what: &str,
    email: &str,
    result: Result<Option<T>, AppError>,
) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("monitor: {what} lookup failed for {email}: {e}");
            None
        }
    }
}
