//! Main crawl orchestration logic
//!
//! This module contains the run state machine that ties everything
//! together:
//! - Loading resume state from the store
//! - Listing candidate tasks
//! - Ledger and fingerprint checks before extraction
//! - The retry loop, pacing, and session recycling
//! - Flushing on every terminal path, including cancellation

use crate::config::Config;
use crate::crawler::backoff::BackoffPolicy;
use crate::crawler::pacer::Pacer;
use crate::crawler::retry::{RetryController, RetryError};
use crate::crawler::session::FetchSession;
use crate::crawler::task::{CrawlTask, Extractor, TaskFetcher};
use crate::shutdown::{ShutdownCoordinator, WaitOutcome};
use crate::state::{CrawlRunState, RunSummary, StopReason};
use crate::store::{open_store, Outcome, Store};
use crate::TidepoolError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

/// Drives one crawl run from resume state to final flush
///
/// Generic over the two collaborator operations: listing tasks and
/// processing a single task. All tunables arrive through the explicit
/// [`Config`] value; the interrupt signal arrives through the
/// [`ShutdownCoordinator`] the caller owns.
pub struct Orchestrator<F, E> {
    config: Arc<Config>,
    store: Box<dyn Store>,
    fetcher: F,
    extractor: E,
    session: Option<FetchSession>,
    retry: RetryController,
    pacer: Pacer,
    shutdown: ShutdownCoordinator,
    state: CrawlRunState,
    config_hash: Option<String>,
}

impl<F, E> Orchestrator<F, E>
where
    F: TaskFetcher,
    E: Extractor,
{
    /// Creates an orchestrator with the store selected by the configuration
    pub fn new(
        config: Config,
        fetcher: F,
        extractor: E,
        shutdown: ShutdownCoordinator,
    ) -> crate::Result<Self> {
        let store = open_store(&config.output, &config.fields)?;
        Self::with_store(config, store, fetcher, extractor, shutdown)
    }

    /// Creates an orchestrator with an explicitly provided store
    pub fn with_store(
        config: Config,
        store: Box<dyn Store>,
        fetcher: F,
        extractor: E,
        shutdown: ShutdownCoordinator,
    ) -> crate::Result<Self> {
        let session = FetchSession::new(config.session.clone())?;
        let retry = RetryController::new(
            BackoffPolicy::from_config(&config.crawl),
            config.crawl.max_attempts,
        );
        let pacer = Pacer::new(
            Duration::from_millis(config.crawl.pace_min_ms),
            Duration::from_millis(config.crawl.pace_max_ms),
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            fetcher,
            extractor,
            session: Some(session),
            retry,
            pacer,
            shutdown,
            state: CrawlRunState::default(),
            config_hash: None,
        })
    }

    /// Attaches the configuration hash recorded in the run summary
    pub fn with_config_hash(mut self, hash: String) -> Self {
        self.config_hash = Some(hash);
        self
    }

    /// Runs the crawl to completion
    ///
    /// The store is flushed on every exit path, so records accepted
    /// before a fatal error or a shutdown request are never discarded.
    pub async fn run(&mut self) -> crate::Result<RunSummary> {
        let started_at = Utc::now();
        let result = self.run_inner().await;

        // Finalize: flush whatever was collected, whatever the outcome
        if let Err(flush_error) = self.store.flush() {
            tracing::error!("Failed to flush store during finalize: {}", flush_error);
            // A fatal error from the run itself takes precedence
            result?;
            return Err(flush_error.into());
        }

        let stop_reason = result?;
        let summary = RunSummary {
            stop_reason,
            persisted: self.state.persisted,
            skipped_duplicate: self.state.skipped_duplicate,
            skipped_incomplete: self.state.skipped_incomplete,
            skipped_seen: self.state.skipped_seen,
            failed: self.state.failed,
            started_at,
            finished_at: Utc::now(),
            config_hash: self.config_hash.clone(),
        };

        tracing::info!(
            "Run finished ({:?}): {} persisted, {} duplicate, {} incomplete, {} failed, {} skipped",
            summary.stop_reason,
            summary.persisted,
            summary.skipped_duplicate,
            summary.skipped_incomplete,
            summary.failed,
            summary.skipped_seen
        );
        Ok(summary)
    }

    async fn run_inner(&mut self) -> crate::Result<StopReason> {
        // LoadState
        let loaded = self.store.load()?;
        self.state = CrawlRunState::from_loaded(loaded, &self.config.fields.key_fields);
        tracing::info!(
            "Resume state: {} persisted records, {} attempted identifiers",
            self.state.seen.len(),
            self.state.attempted.len()
        );

        // FetchTasks; a failure here aborts the whole run
        let limit = self.config.crawl.item_cap.map(|cap| cap as usize);
        let tasks = self
            .fetcher
            .list(self.session()?, limit)
            .await
            .map_err(TidepoolError::TaskFetcher)?;
        tracing::info!("Fetched {} candidate tasks", tasks.len());

        let mut attempted_any = false;
        for task in &tasks {
            if self.shutdown.is_shutdown_requested() {
                return Ok(StopReason::Cancelled);
            }
            if self.state.cap_reached(self.config.crawl.item_cap) {
                tracing::info!(
                    "Reached item cap of {}, stopping",
                    self.state.persisted
                );
                return Ok(StopReason::CapReached);
            }

            // Skips are free: no ledger entry, no pacing, no cap charge
            if self.state.attempted.contains(&task.id)
                || self.state.seen.contains(&task.fingerprint())
            {
                tracing::info!("Skipping {} as it has already been processed", task.label);
                self.state.skipped_seen += 1;
                continue;
            }

            // Pace between attempts, never before the first one
            if attempted_any && self.pacer.wait(&self.shutdown).await == WaitOutcome::Cancelled {
                return Ok(StopReason::Cancelled);
            }
            attempted_any = true;

            self.process_task(task).await?;
        }

        if self.shutdown.is_shutdown_requested() {
            Ok(StopReason::Cancelled)
        } else if self.state.cap_reached(self.config.crawl.item_cap) {
            Ok(StopReason::CapReached)
        } else {
            Ok(StopReason::TasksExhausted)
        }
    }

    /// Processes a single task through ledger, retry, and persistence
    ///
    /// Task-scoped failures are absorbed here; only store and session
    /// errors escape, and those abort the run.
    async fn process_task(&mut self, task: &CrawlTask) -> crate::Result<()> {
        tracing::info!("Processing {} ({})", task.label, task.id);

        // The ledger entry lands before extraction, so a crash mid-task
        // does not cause endless refetching of a slow item
        self.store.append_to_ledger(&task.id, &task.label)?;
        self.state.attempted.insert(task.id.clone());

        let outcome = self
            .retry
            .execute(&self.extractor, self.session()?, task, &self.shutdown)
            .await;

        match outcome {
            Ok(record) => match self.store.record(record)? {
                Outcome::Persisted => {
                    self.state.persisted += 1;
                    tracing::info!("Persisted record for {}", task.label);
                }
                Outcome::SkippedDuplicate => {
                    self.state.skipped_duplicate += 1;
                    tracing::info!("Record for {} was a duplicate", task.label);
                }
                Outcome::SkippedIncomplete => {
                    self.state.skipped_incomplete += 1;
                    tracing::warn!("Record for {} was missing required fields", task.label);
                }
            },
            Err(RetryError::Permanent(message)) => {
                self.state.failed += 1;
                tracing::warn!("Skipping {}: {}", task.label, message);
            }
            Err(RetryError::Exhausted { attempts, last_error }) => {
                self.state.failed += 1;
                tracing::warn!(
                    "Skipping {} after {} attempts: {}",
                    task.label,
                    attempts,
                    last_error
                );
                // Persistent failure usually means a stale session
                self.replace_session()?;
            }
            Err(RetryError::Cancelled) => {
                // The loop observes the shutdown flag on its next check
                tracing::info!("Cancelled while waiting to retry {}", task.label);
            }
        }

        Ok(())
    }

    fn session(&self) -> crate::Result<&FetchSession> {
        self.session.as_ref().ok_or(TidepoolError::SessionClosed)
    }

    /// Replaces the fetch session, old one first fully released
    fn replace_session(&mut self) -> crate::Result<()> {
        let replacement = match self.session.take() {
            Some(old) => old.recycle()?,
            None => FetchSession::new(self.config.session.clone())?,
        };
        self.session = Some(replacement);
        Ok(())
    }
}

/// Runs a complete crawl with the store selected by the configuration
///
/// # Arguments
///
/// * `config` - The orchestrator configuration
/// * `fetcher` - Collaborator producing the candidate tasks
/// * `extractor` - Collaborator processing a single task
/// * `shutdown` - Cancellation signal, usually wired to the interrupt handler
pub async fn run_crawl<F, E>(
    config: Config,
    fetcher: F,
    extractor: E,
    shutdown: ShutdownCoordinator,
) -> crate::Result<RunSummary>
where
    F: TaskFetcher,
    E: Extractor,
{
    let mut orchestrator = Orchestrator::new(config, fetcher, extractor, shutdown)?;
    orchestrator.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CrawlConfig, FieldsConfig, OutputConfig, SessionConfig, SinkFormat,
    };
    use crate::record::Record;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct EmptyFetcher;

    #[async_trait]
    impl TaskFetcher for EmptyFetcher {
        async fn list(
            &self,
            _session: &FetchSession,
            _limit: Option<usize>,
        ) -> anyhow::Result<Vec<CrawlTask>> {
            Ok(vec![])
        }
    }

    struct NeverExtractor;

    #[async_trait]
    impl Extractor for NeverExtractor {
        async fn process(
            &self,
            _session: &FetchSession,
            _task: &CrawlTask,
        ) -> Result<Record, crate::crawler::ExtractError> {
            unreachable!("no tasks to process")
        }
    }

    fn create_test_config(dir: &TempDir) -> Config {
        Config {
            crawl: CrawlConfig {
                max_attempts: 3,
                backoff_base_ms: 100,
                backoff_cap_ms: 1000,
                pace_min_ms: 1,
                pace_max_ms: 2,
                item_cap: None,
                shutdown_grace_ms: 1000,
            },
            session: SessionConfig {
                user_agent: "TestBot/1.0".to_string(),
                request_timeout_ms: 5000,
                connect_timeout_ms: 5000,
                accept_language: None,
            },
            output: OutputConfig {
                format: SinkFormat::Csv,
                results_path: Some(dir.path().join("out.csv").display().to_string()),
                output_dir: None,
                ledger_path: dir.path().join("ledger.csv").display().to_string(),
            },
            fields: FieldsConfig {
                names: vec!["name".to_string()],
                key_fields: vec!["name".to_string()],
                required: vec![],
            },
            tasks: None,
        }
    }

    #[tokio::test]
    async fn test_empty_task_list_completes() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);

        let mut orchestrator = Orchestrator::new(
            config,
            EmptyFetcher,
            NeverExtractor,
            ShutdownCoordinator::new(),
        )
        .unwrap();

        let summary = orchestrator.run().await.unwrap();
        assert_eq!(summary.stop_reason, StopReason::TasksExhausted);
        assert_eq!(summary.persisted, 0);
        assert_eq!(summary.total_attempted(), 0);
    }

    #[tokio::test]
    async fn test_run_flushes_even_with_no_work() {
        let dir = TempDir::new().unwrap();
        let config = create_test_config(&dir);
        let results_path = dir.path().join("out.csv");

        let mut orchestrator = Orchestrator::new(
            config,
            EmptyFetcher,
            NeverExtractor,
            ShutdownCoordinator::new(),
        )
        .unwrap();
        orchestrator.run().await.unwrap();

        // The flush wrote the header even though nothing was persisted
        let content = std::fs::read_to_string(results_path).unwrap();
        assert_eq!(content.trim(), "name");
    }
}
