//! Background Tasks Module
//!
//! Tasks that run periodically while the diagnostics server is up.
//!
//! # Tasks
//! - Stats reporter: logs master cache statistics at a configured interval

mod stats_reporter;

pub use stats_reporter::spawn_stats_task;
