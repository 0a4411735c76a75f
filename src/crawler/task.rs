//! Collaborator interfaces: task listing and item extraction
//!
//! The orchestrator is generic over these two traits. What a "task"
//! points at and how its fields are extracted is entirely the
//! implementor's business; the core only needs a stable identifier, a
//! label, and the identity keys.

use crate::crawler::session::FetchSession;
use crate::record::{Fingerprint, Record};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Opaque unit of work produced by a [`TaskFetcher`]
#[derive(Debug, Clone)]
pub struct CrawlTask {
    /// Stable identifier used for the attempt ledger (typically a URL)
    pub id: String,

    /// Human-readable label (typically the item name)
    pub label: String,

    /// Identity field values the fingerprint derives from
    pub keys: Vec<String>,
}

impl CrawlTask {
    /// Creates a task
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        keys: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Duplicate-detection fingerprint of this task
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::new(&self.keys)
    }
}

/// Classified extraction failure, consumed by the backoff policy
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Worth retrying: timeouts, temporary unavailability
    #[error("transient failure: {0}")]
    Transient(String),

    /// The remote asked us to slow down
    #[error("rate limited")]
    RateLimited {
        /// Server-suggested wait, when the response carried one
        retry_after: Option<Duration>,
    },

    /// Retrying will not help: parse failure, validation failure
    #[error("permanent failure: {0}")]
    Permanent(String),
}

/// Produces the candidate work items for a run
///
/// Listing may itself hit the network through the provided session. Any
/// failure here is run-fatal, not task-scoped: a crawl that cannot
/// enumerate its work aborts rather than silently doing nothing.
#[async_trait]
pub trait TaskFetcher: Send + Sync {
    /// Yields candidate tasks in processing order
    ///
    /// `limit` is a hint derived from the item cap; fetchers may return
    /// more (skipped duplicates do not count against the cap) or fewer.
    async fn list(
        &self,
        session: &FetchSession,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<CrawlTask>>;
}

/// Fetches and extracts one task into a structured record
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Processes a single task
    ///
    /// Implementations classify their failures so the retry controller
    /// can tell a timeout from a hopeless page.
    async fn process(
        &self,
        session: &FetchSession,
        task: &CrawlTask,
    ) -> Result<Record, ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_fingerprint_normalizes_keys() {
        let a = CrawlTask::new("https://example.com/rome", "Rome", ["  Rome Weekend "]);
        let b = CrawlTask::new("https://example.com/rome-2", "Rome", ["rome weekend"]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_extract_error_display() {
        let err = ExtractError::Transient("connection reset".to_string());
        assert_eq!(err.to_string(), "transient failure: connection reset");
    }
}
