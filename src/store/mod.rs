//! Store module for persisting crawl results
//!
//! This module unifies the persistence strategies behind one interface:
//! - A merged tabular CSV sink (one row per record)
//! - A per-item JSON sink (one file per record)
//! - An append-only attempt ledger shared by both
//!
//! Which result sink backs the store is a configuration choice, not a
//! code-path choice.

mod csv_sink;
mod json_sink;
mod ledger;

pub use csv_sink::CsvStore;
pub use json_sink::JsonStore;
pub use ledger::Ledger;

use crate::config::{FieldsConfig, OutputConfig, SinkFormat};
use crate::record::{Fingerprint, Record};
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store misconfigured: {0}")]
    Misconfigured(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// What happened to a record offered to the store
///
/// Inspected by the caller instead of being thrown as control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The record was accepted and is durable
    Persisted,
    /// A record with the same fingerprint already exists
    SkippedDuplicate,
    /// A required field was missing or empty
    SkippedIncomplete,
}

/// Resume state read from a store at startup
#[derive(Debug, Default)]
pub struct LoadedState {
    /// Identifiers of work attempted by any previous run (from the ledger)
    pub attempted: HashSet<String>,

    /// Records persisted by previous runs
    pub existing: Vec<Record>,
}

/// Trait for result store backends
///
/// A store owns two views of crawl history: the fast attempt ledger and
/// the deduplicated result sink. An absent backing file means no prior
/// history, never an error.
pub trait Store: Send {
    /// Reads persisted state for resume
    fn load(&mut self) -> StoreResult<LoadedState>;

    /// Full duplicate check against persisted records
    fn contains(&self, fingerprint: &Fingerprint) -> bool;

    /// Logs that a task is about to be processed; idempotent
    fn append_to_ledger(&mut self, identifier: &str, label: &str) -> StoreResult<()>;

    /// Offers a record for persistence
    fn record(&mut self, record: Record) -> StoreResult<Outcome>;

    /// Guarantees all accepted records are durable before returning
    ///
    /// Invoked on every terminal path: success, fatal error, and
    /// cancellation.
    fn flush(&mut self) -> StoreResult<()>;
}

/// Opens the store selected by the output configuration
pub fn open_store(output: &OutputConfig, fields: &FieldsConfig) -> StoreResult<Box<dyn Store>> {
    match output.format {
        SinkFormat::Csv => {
            let path = output.results_path.as_deref().ok_or_else(|| {
                StoreError::Misconfigured("csv format requires results-path".to_string())
            })?;
            Ok(Box::new(CsvStore::new(
                path,
                &output.ledger_path,
                fields.clone(),
            )))
        }
        SinkFormat::Json => {
            let dir = output.output_dir.as_deref().ok_or_else(|| {
                StoreError::Misconfigured("json format requires output-dir".to_string())
            })?;
            Ok(Box::new(JsonStore::new(
                dir,
                &output.ledger_path,
                fields.clone(),
            )))
        }
    }
}
