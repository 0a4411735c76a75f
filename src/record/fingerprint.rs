use std::fmt;

/// Normalized identity key used to detect duplicate logical items
///
/// A fingerprint is derived from one or more identifying field values.
/// Each part is whitespace-trimmed and case-folded before comparison, so
/// `"Hotel Panorama "` and `"hotel panorama"` yield the same fingerprint.
/// Two tasks or records with equal fingerprints are the same logical item;
/// only one of them may ever be durably recorded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(Vec<String>);

impl Fingerprint {
    /// Builds a fingerprint from raw identifying values
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Fingerprint(
            parts
                .into_iter()
                .map(|p| normalize_part(p.as_ref()))
                .collect(),
        )
    }

    /// Returns the normalized parts of this fingerprint
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Returns true if every part normalized to the empty string
    ///
    /// An empty fingerprint cannot identify anything and must never be
    /// used for duplicate suppression.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|p| p.is_empty())
    }
}

fn normalize_part(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("|"))
    }
}
