pub mod aggregator;
pub mod store;

pub use aggregator::{
    DEFAULT_POLL_INTERVAL, EmployeeSnapshot, Monitor, MonitorError, MonitorState,
    RECENT_SAMPLE_WINDOW_SECS, Snapshot,
};
pub use store::{ActivityStore, PgStore};
