use crate::config::FieldsConfig;
use crate::record::{Fingerprint, Record};
use crate::store::ledger::Ledger;
use crate::store::{LoadedState, Outcome, Store, StoreResult};
use std::collections::HashSet;
use std::fs::File;
use std::path::PathBuf;

/// Tabular result sink backed by a single merged CSV file
///
/// The file header is the full configured field set; missing fields
/// serialize as empty strings. Every persistence pass rewrites the file
/// as existing-rows-then-new-rows deduplicated by fingerprint, so the
/// sink always reflects the full deduplicated history rather than just
/// the current run. The rewrite happens after every accepted record so
/// partial progress survives a crash mid-run.
pub struct CsvStore {
    path: PathBuf,
    fields: FieldsConfig,
    ledger: Ledger,
    rows: Vec<Record>,
    seen: HashSet<Fingerprint>,
}

impl CsvStore {
    /// Creates a CSV store; nothing is read until [`Store::load`]
    pub fn new(
        path: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
        fields: FieldsConfig,
    ) -> Self {
        Self {
            path: path.into(),
            fields,
            ledger: Ledger::new(ledger_path),
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Reads records persisted by previous runs
    ///
    /// Rows are mapped onto the configured field set by header name, so a
    /// file written with an older field ordering still loads correctly.
    fn read_existing(&self) -> StoreResult<Vec<Record>> {
        if !self.path.exists() {
            tracing::debug!(
                "No result file found at {}, starting fresh",
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;
            let mut record = Record::new();
            for (name, value) in headers.iter().zip(row.iter()) {
                if !value.is_empty() {
                    record.set(name, value);
                }
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Rewrites the result file from the in-memory row set
    fn rewrite(&self) -> StoreResult<()> {
        let mut file = File::create(&self.path)?;
        {
            let mut writer = csv::Writer::from_writer(&mut file);
            writer.write_record(&self.fields.names)?;
            for row in &self.rows {
                writer.write_record(self.fields.names.iter().map(|n| row.get(n).unwrap_or("")))?;
            }
            writer.flush()?;
        }
        file.sync_all()?;
        Ok(())
    }
}

impl Store for CsvStore {
    fn load(&mut self) -> StoreResult<LoadedState> {
        let attempted = self.ledger.load()?;
        let existing = self.read_existing()?;

        self.seen = existing
            .iter()
            .map(|r| r.fingerprint(&self.fields.key_fields))
            .collect();
        self.rows = existing.clone();

        tracing::info!(
            "Loaded {} existing records from {}",
            self.rows.len(),
            self.path.display()
        );
        Ok(LoadedState {
            attempted,
            existing,
        })
    }

    fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    fn append_to_ledger(&mut self, identifier: &str, label: &str) -> StoreResult<()> {
        self.ledger.append(identifier, label)
    }

    fn record(&mut self, record: Record) -> StoreResult<Outcome> {
        if !record.is_complete(&self.fields.required) {
            return Ok(Outcome::SkippedIncomplete);
        }

        let fingerprint = record.fingerprint(&self.fields.key_fields);
        if self.seen.contains(&fingerprint) {
            return Ok(Outcome::SkippedDuplicate);
        }

        self.rows.push(record);
        self.seen.insert(fingerprint);
        self.rewrite()?;
        Ok(Outcome::Persisted)
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.rewrite()
    }
}
