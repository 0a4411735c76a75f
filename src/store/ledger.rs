use crate::store::StoreResult;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::PathBuf;

/// Append-only attempt log
///
/// The ledger records `(identifier, label)` the moment a task begins
/// processing, before extraction has succeeded. It is a deliberately
/// weaker, faster pre-check than full fingerprint deduplication: a task
/// whose identifier appears here is not refetched, even if it never
/// produced a record.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    identifiers: HashSet<String>,
}

const LEDGER_HEADER: [&str; 2] = ["identifier", "label"];

impl Ledger {
    /// Creates a ledger handle; nothing is read until [`Ledger::load`]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            identifiers: HashSet::new(),
        }
    }

    /// Reads all previously logged identifiers
    ///
    /// A missing file means no prior history, not an error.
    pub fn load(&mut self) -> StoreResult<HashSet<String>> {
        self.identifiers.clear();

        if !self.path.exists() {
            tracing::debug!("No ledger found at {}, starting fresh", self.path.display());
            return Ok(HashSet::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        for result in reader.records() {
            let row = result?;
            if let Some(identifier) = row.get(0) {
                if !identifier.is_empty() {
                    self.identifiers.insert(identifier.to_string());
                }
            }
        }

        tracing::info!(
            "Loaded {} attempted identifiers from {}",
            self.identifiers.len(),
            self.path.display()
        );
        Ok(self.identifiers.clone())
    }

    /// Appends an entry, flushing it to disk before returning
    ///
    /// Writing the same identifier twice is a no-op, not an error.
    pub fn append(&mut self, identifier: &str, label: &str) -> StoreResult<()> {
        if self.identifiers.contains(identifier) {
            return Ok(());
        }

        let write_header = self
            .path
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut file);
            if write_header {
                writer.write_record(LEDGER_HEADER)?;
            }
            writer.write_record([identifier, label])?;
            writer.flush()?;
        }
        file.sync_all()?;

        self.identifiers.insert(identifier.to_string());
        Ok(())
    }

    /// Returns true if the identifier was already logged
    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    /// Number of distinct identifiers logged
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    /// Returns true if no identifiers were logged
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}
