//! Review recording and due selection
//!
//! This module provides:
//! - Ratings, scheduling state and per-review scheduler settings
//! - The `Scheduler` seam and an SM-2 style default implementation
//! - Append-only review and snapshot storage
//! - Ranking of live reviewables by due date

pub mod algorithm;
pub mod models;
pub mod selection;
pub mod storage;

pub use algorithm::{format_interval, preview_intervals, IntervalScheduler, Scheduler};
pub use models::*;
pub use selection::{review_stats, select_next, select_next_batch};
pub use storage::{latest_snapshot, list_reviews, list_snapshots, record_review};
