use crate::record::Fingerprint;
use crate::store::LoadedState;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// In-memory aggregate for one orchestrator invocation
///
/// Created at run start by merging the store's persisted state, mutated
/// only by the orchestrator, and discarded at run end after the final
/// flush. `seen` is a snapshot of fingerprints persisted by *previous*
/// runs; items recorded during the current run are deduplicated by the
/// sink itself at write time.
#[derive(Debug, Default)]
pub struct CrawlRunState {
    /// Fingerprints of records persisted before this run started
    pub seen: HashSet<Fingerprint>,

    /// Identifiers of work attempted by this or any previous run
    pub attempted: HashSet<String>,

    /// Records persisted during this run
    pub persisted: u64,

    /// Records the sink rejected as duplicates during this run
    pub skipped_duplicate: u64,

    /// Records the sink rejected as incomplete during this run
    pub skipped_incomplete: u64,

    /// Tasks skipped before extraction (ledger or fingerprint hit)
    pub skipped_seen: u64,

    /// Tasks that exhausted their attempt budget or failed permanently
    pub failed: u64,
}

impl CrawlRunState {
    /// Builds run state from the store's loaded history
    pub fn from_loaded(loaded: LoadedState, key_fields: &[String]) -> Self {
        let seen = loaded
            .existing
            .iter()
            .map(|record| record.fingerprint(key_fields))
            .collect();

        Self {
            seen,
            attempted: loaded.attempted,
            ..Self::default()
        }
    }

    /// Returns true once the configured item cap has been met
    pub fn cap_reached(&self, cap: Option<u64>) -> bool {
        cap.map_or(false, |limit| self.persisted >= limit)
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The task list was processed to the end
    TasksExhausted,
    /// The configured item cap was reached
    CapReached,
    /// Shutdown was requested
    Cancelled,
}

/// Final accounting for a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stop_reason: StopReason,
    pub persisted: u64,
    pub skipped_duplicate: u64,
    pub skipped_incomplete: u64,
    pub skipped_seen: u64,
    pub failed: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Hash of the configuration file that produced this run, when known
    pub config_hash: Option<String>,
}

impl RunSummary {
    /// Total tasks that went through the extraction pipeline
    pub fn total_attempted(&self) -> u64 {
        self.persisted + self.skipped_duplicate + self.skipped_incomplete + self.failed
    }
}
