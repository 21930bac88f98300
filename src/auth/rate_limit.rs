use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: u32 = 5;
const WINDOW: Duration = Duration::from_secs(900); // 15 minutes

struct Window {
    started: Instant,
    failures: u32,
}

/// Fixed-window login throttle keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// True when the IP has exhausted its attempts for the current window.
    /// An expired window is dropped on the way.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(window) = map.get(&ip) {
            if window.started.elapsed() >= WINDOW {
                map.remove(&ip);
                return false;
            }
            return window.failures >= MAX_ATTEMPTS;
        }
        false
    }

    /// Record a failed login attempt for the given IP.
    pub fn record_failure(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let window = map.entry(ip).or_insert(Window {
            started: now,
            failures: 0,
        });
        if window.started.elapsed() >= WINDOW {
            window.started = now;
            window.failures = 0;
        }
        window.failures += 1;
    }

    /// Forget the IP entirely (call on successful login).
    pub fn clear(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&ip);
    }
}
