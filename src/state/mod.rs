//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlRunState`: per-invocation aggregate of resume state and counters
//! - `RunSummary` / `StopReason`: final accounting returned by a run

mod run_state;

// Re-export main types
pub use run_state::{CrawlRunState, RunSummary, StopReason};
