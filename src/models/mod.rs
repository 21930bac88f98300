pub mod activity;
pub mod app_usage;
pub mod productivity;
pub mod profile;
pub mod web_usage;
pub mod work_session;
