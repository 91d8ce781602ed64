// Admin moderation panel: alumni verification, error log, dashboard counts.

pub mod error_log;
pub mod handlers;
pub mod stats;
