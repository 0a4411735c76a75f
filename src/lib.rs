//! Tidepool: a resumable, polite crawl orchestrator
//!
//! This crate implements the orchestration engine for incremental crawls:
//! resume state and duplicate detection, retry with jittered backoff,
//! request pacing, incremental persistence, and cooperative shutdown.
//! What gets fetched and how fields are extracted is supplied by
//! collaborators implementing [`TaskFetcher`] and [`Extractor`].

pub mod config;
pub mod crawler;
pub mod record;
pub mod shutdown;
pub mod state;
pub mod store;

use thiserror::Error;

/// Main error type for Tidepool operations
#[derive(Debug, Error)]
pub enum TidepoolError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Task fetcher failed: {0}")]
    TaskFetcher(anyhow::Error),

    #[error("HTTP session error: {0}")]
    Session(#[from] reqwest::Error),

    #[error("Fetch session unavailable")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Tidepool operations
pub type Result<T> = std::result::Result<T, TidepoolError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlTask, ExtractError, Extractor, FetchSession, Orchestrator, TaskFetcher};
pub use record::{Fingerprint, Record};
pub use shutdown::ShutdownCoordinator;
pub use store::{Outcome, Store};
