//! Cooperative shutdown coordination
//!
//! One interrupt requests a graceful stop: in-flight work finishes its
//! current step, pending waits return early, and the orchestrator flushes
//! before exiting. A bounded grace period guarantees the operator's
//! interrupt is honored even if cleanup hangs, and a second interrupt
//! terminates immediately.

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a cancellable wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration elapsed
    TimedOut,
    /// Shutdown was requested before the duration elapsed
    Cancelled,
}

/// Process-wide cooperative cancellation signal
///
/// Cheap to clone; all clones observe the same shutdown request.
#[derive(Debug, Clone, Default)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Creates a coordinator with no shutdown requested
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the shutdown signal
    ///
    /// Idempotent: repeated calls have no further effect.
    pub fn request_shutdown(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("Shutdown requested, finishing current work");
        }
        self.token.cancel();
    }

    /// Returns true once shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Sleeps for `duration` unless shutdown interrupts the wait
    pub async fn wait_or_cancel(&self, duration: Duration) -> WaitOutcome {
        tokio::select! {
            _ = self.token.cancelled() => WaitOutcome::Cancelled,
            _ = tokio::time::sleep(duration) => WaitOutcome::TimedOut,
        }
    }

    /// Resolves once shutdown has been requested
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Routes the process interrupt signal into a coordinator
///
/// The first Ctrl-C requests a graceful shutdown and arms a watchdog that
/// force-exits the process after `grace` if cleanup has not finished. A
/// second Ctrl-C exits immediately.
pub fn install_signal_handler(coordinator: ShutdownCoordinator, grace: Duration) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::error!("Failed to listen for interrupt signal");
            return;
        }

        tracing::warn!(
            "Interrupt received, shutting down (grace period {:?})",
            grace
        );
        coordinator.request_shutdown();

        // Watchdog: if cleanup hangs past the grace period, terminate anyway
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            tracing::error!("Grace period expired, terminating");
            std::process::exit(130);
        });

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Second interrupt received, terminating");
            std::process::exit(130);
        }
    });
}
