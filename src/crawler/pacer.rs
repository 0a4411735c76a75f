//! Politeness delay between successive task attempts
//!
//! One task, one request burst, then a randomized pause. The pause is a
//! race against the shutdown signal so an operator interrupt is observed
//! promptly instead of after the full delay.

use crate::shutdown::{ShutdownCoordinator, WaitOutcome};
use rand::Rng;
use std::time::Duration;

/// Inserts a randomized delay between tasks
#[derive(Debug, Clone)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// Creates a pacer sleeping uniformly within `[min, max]`
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Draws the next delay
    pub fn pick_delay(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    /// Sleeps for a randomized delay, or returns early on shutdown
    ///
    /// The orchestrator skips this before the very first task and after
    /// the last one.
    pub async fn wait(&self, shutdown: &ShutdownCoordinator) -> WaitOutcome {
        let delay = self.pick_delay();
        tracing::debug!("Waiting {:?} before next task", delay);
        shutdown.wait_or_cancel(delay).await
    }
}
