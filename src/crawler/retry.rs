//! Per-task retry loop
//!
//! Composes the backoff policy with cancellation-aware sleeps. The
//! controller never aborts an in-flight extraction attempt; cancellation
//! is only observed between attempts.

use crate::crawler::backoff::BackoffPolicy;
use crate::crawler::session::FetchSession;
use crate::crawler::task::{CrawlTask, ExtractError, Extractor};
use crate::record::Record;
use crate::shutdown::{ShutdownCoordinator, WaitOutcome};

/// Why a task's attempt sequence ended without a record
#[derive(Debug)]
pub enum RetryError {
    /// Retrying will not help; the task is skipped and the run continues
    Permanent(String),

    /// The attempt budget ran out; the caller should recycle the fetch
    /// session before moving on
    Exhausted {
        attempts: u32,
        last_error: ExtractError,
    },

    /// Shutdown was requested during a backoff wait
    Cancelled,
}

/// Drives a single task through its attempt budget
#[derive(Debug, Clone)]
pub struct RetryController {
    policy: BackoffPolicy,
    max_attempts: u32,
}

impl RetryController {
    /// Creates a controller; `max_attempts` includes the first attempt
    pub fn new(policy: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            policy,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Runs the extractor against a task until success, a permanent
    /// failure, budget exhaustion, or cancellation
    ///
    /// Invariant: at most `max_attempts` extractor calls per task.
    pub async fn execute<E>(
        &self,
        extractor: &E,
        session: &FetchSession,
        task: &CrawlTask,
        shutdown: &ShutdownCoordinator,
    ) -> Result<Record, RetryError>
    where
        E: Extractor + ?Sized,
    {
        let mut attempt: u32 = 0;

        loop {
            match extractor.process(session, task).await {
                Ok(record) => return Ok(record),

                Err(ExtractError::Permanent(message)) => {
                    tracing::warn!("Permanent failure for {}: {}", task.label, message);
                    return Err(RetryError::Permanent(message));
                }

                Err(error) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            "Giving up on {} after {} attempts: {}",
                            task.label,
                            attempt,
                            error
                        );
                        return Err(RetryError::Exhausted {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = self.policy.next_delay(attempt - 1, &error);
                    tracing::info!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        task.label,
                        error,
                        delay
                    );

                    if shutdown.wait_or_cancel(delay).await == WaitOutcome::Cancelled {
                        return Err(RetryError::Cancelled);
                    }
                }
            }
        }
    }
}
