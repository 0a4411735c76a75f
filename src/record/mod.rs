//! Record and identity types for crawl output
//!
//! # Components
//!
//! - `Record`: the structured output of successfully processing one task
//! - `Fingerprint`: normalized identity key used for duplicate detection
//! - `slugify`: stable filename derivation for the per-item sink

mod fingerprint;
mod slug;

pub use fingerprint::Fingerprint;
pub use slug::slugify;

use std::collections::BTreeMap;

/// Structured output of successfully processing a task
///
/// A record is an ordered map from configured field names to string
/// values. The orchestration core never interprets payload fields; it
/// only consults the key fields (for fingerprints) and the required
/// fields (for the completeness check).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: BTreeMap<String, String>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field assignment
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field value, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns a field value if present
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns all fields in name order
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Computes the fingerprint of this record over the given key fields
    ///
    /// Missing key fields contribute an empty part, so the result lines up
    /// with fingerprints computed from tasks that carry the same keys.
    pub fn fingerprint(&self, key_fields: &[String]) -> Fingerprint {
        Fingerprint::new(key_fields.iter().map(|k| self.get(k).unwrap_or("")))
    }

    /// Returns true if every required field is present and non-empty
    pub fn is_complete(&self, required_fields: &[String]) -> bool {
        required_fields
            .iter()
            .all(|k| self.get(k).is_some_and(|v| !v.trim().is_empty()))
    }
}
