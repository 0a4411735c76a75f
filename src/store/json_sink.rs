use crate::config::FieldsConfig;
use crate::record::{slugify, Fingerprint, Record};
use crate::store::ledger::Ledger;
use crate::store::{LoadedState, Outcome, Store, StoreResult};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Per-item result sink: one JSON document per record
///
/// Each record maps to exactly one file named from the slug of its first
/// key field. Files are written eagerly as records are accepted, so
/// `flush` has nothing left to do; resume state is rebuilt by scanning
/// the directory on load.
pub struct JsonStore {
    dir: PathBuf,
    fields: FieldsConfig,
    ledger: Ledger,
    seen: HashSet<Fingerprint>,
    filenames: HashSet<String>,
}

impl JsonStore {
    /// Creates a JSON store; nothing is read until [`Store::load`]
    pub fn new(
        dir: impl Into<PathBuf>,
        ledger_path: impl Into<PathBuf>,
        fields: FieldsConfig,
    ) -> Self {
        Self {
            dir: dir.into(),
            fields,
            ledger: Ledger::new(ledger_path),
            seen: HashSet::new(),
            filenames: HashSet::new(),
        }
    }

    /// Picks a filename stem for the record, disambiguating slug collisions
    ///
    /// Two distinct logical items whose key values slug identically get
    /// separate files: the second one carries a short fingerprint digest
    /// suffix. The choice is deterministic, so reruns produce the same
    /// paths.
    fn filename_for(&self, record: &Record, fingerprint: &Fingerprint) -> String {
        let key_value = self
            .fields
            .key_fields
            .first()
            .and_then(|k| record.get(k))
            .unwrap_or("");
        let slug = slugify(key_value);

        if !self.filenames.contains(&slug) {
            return slug;
        }

        let mut hasher = Sha256::new();
        hasher.update(fingerprint.to_string().as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{}-{}", slug, &digest[..8])
    }

    /// Parses one persisted document back into a record
    ///
    /// Non-string values are stringified rather than rejected, so a file
    /// touched by hand still loads.
    fn parse_document(content: &str) -> Option<Record> {
        let value: serde_json::Value = serde_json::from_str(content).ok()?;
        let map = value.as_object()?;

        let mut record = Record::new();
        for (name, value) in map {
            match value {
                serde_json::Value::String(s) => record.set(name, s.as_str()),
                other => record.set(name, other.to_string()),
            }
        }
        Some(record)
    }
}

impl Store for JsonStore {
    fn load(&mut self) -> StoreResult<LoadedState> {
        let attempted = self.ledger.load()?;

        self.seen.clear();
        self.filenames.clear();
        let mut existing = Vec::new();

        std::fs::create_dir_all(&self.dir)?;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }

            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                self.filenames.insert(stem.to_string());
            }

            let content = match std::fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!("Skipping unreadable result file {}: {}", path.display(), e);
                    continue;
                }
            };

            match Self::parse_document(&content) {
                Some(record) => {
                    self.seen.insert(record.fingerprint(&self.fields.key_fields));
                    existing.push(record);
                }
                None => {
                    tracing::warn!("Skipping unparseable result file {}", path.display());
                }
            }
        }

        tracing::info!(
            "Loaded {} existing records from {}",
            existing.len(),
            self.dir.display()
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

        let stem = self.filename_for(&record, &fingerprint);
        let path = self.dir.join(format!("{}.json", stem));

        let document = serde_json::to_string_pretty(record.fields())?;
        let mut file = File::create(&path)?;
        file.write_all(document.as_bytes())?;
        file.sync_all()?;

        tracing::debug!("Saved record to {}", path.display());
        self.seen.insert(fingerprint);
        self.filenames.insert(stem);
        Ok(Outcome::Persisted)
    }

    fn flush(&mut self) -> StoreResult<()> {
        // Records are written and synced as they are accepted
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_fields() -> FieldsConfig {
        FieldsConfig {
            names: vec![
                "offer_name".to_string(),
                "program".to_string(),
                "link".to_string(),
            ],
            key_fields: vec!["offer_name".to_string()],
            required: vec!["offer_name".to_string(), "program".to_string()],
        }
    }

    fn store_in(dir: &TempDir) -> JsonStore {
        JsonStore::new(
            dir.path().join("detailed_offers"),
            dir.path().join("attempted.csv"),
            test_fields(),
        )
    }

    fn offer(name: &str) -> Record {
        Record::new()
            .with("offer_name", name)
            .with("program", "Day 1: arrival")
            .with("link", format!("https://example.com/{}", name))
    }

    #[test]
    fn test_record_writes_one_file_per_item() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.load().unwrap();

        assert_eq!(store.record(offer("Rome Weekend")).unwrap(), Outcome::Persisted);
        assert_eq!(store.record(offer("Malta")).unwrap(), Outcome::Persisted);

        assert!(dir.path().join("detailed_offers/rome-weekend.json").exists());
        assert!(dir.path().join("detailed_offers/malta.json").exists());
    }

    #[test]
    fn test_cyrillic_names_get_readable_files() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.load().unwrap();

        store.record(offer("Почивка в Гърция")).unwrap();
        assert!(dir
            .path()
            .join("detailed_offers/почивка-в-гърция.json")
            .exists());
    }

    #[test]
    fn test_duplicate_skipped_across_runs() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = store_in(&dir);
            store.load().unwrap();
            store.record(offer("Rome Weekend")).unwrap();
        }

        let mut second_run = store_in(&dir);
        let state = second_run.load().unwrap();
        assert_eq!(state.existing.len(), 1);
        assert_eq!(
            second_run.record(offer("rome weekend")).unwrap(),
            Outcome::SkippedDuplicate
        );

        // Still exactly one file on disk
        let count = std::fs::read_dir(dir.path().join("detailed_offers"))
            .unwrap()
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_incomplete_record_never_written() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.load().unwrap();

        let incomplete = Record::new().with("offer_name", "Rome Weekend");
        assert_eq!(store.record(incomplete).unwrap(), Outcome::SkippedIncomplete);

        let count = std::fs::read_dir(dir.path().join("detailed_offers"))
            .unwrap()
            .count();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_slug_collision_disambiguated() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.load().unwrap();

        // Distinct items ("Rome!" vs "Rome?") slug to the same stem
        store.record(offer("Rome!")).unwrap();
        store.record(offer("Rome?")).unwrap();

        let count = std::fs::read_dir(dir.path().join("detailed_offers"))
            .unwrap()
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_unparseable_file_tolerated_on_load() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("detailed_offers");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("broken.json"), "not json at all").unwrap();

        let mut store = store_in(&dir);
        let state = store.load().unwrap();
        assert!(state.existing.is_empty());

        // The broken file's stem stays reserved so it is never overwritten
        store.record(offer("Broken")).unwrap();
        assert_eq!(
            std::fs::read_to_string(out.join("broken.json")).unwrap(),
            "not json at all"
        );
        let disambiguated = std::fs::read_dir(&out)
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .any(|name| name.starts_with("broken-") && name.ends_with(".json"));
        assert!(disambiguated);
    }
}
