use sha2::{Digest, Sha256};

/// Derives a stable, filename-safe slug from an identifying field value
///
/// # Rules
///
/// 1. Leading/trailing whitespace is ignored
/// 2. Alphanumeric characters (any script, so Cyrillic names survive) are
///    kept and lowercased
/// 3. Every run of other characters collapses to a single `-`
/// 4. No leading or trailing `-`
/// 5. If nothing survives normalization, a 12-character SHA-256 prefix of
///    the raw value is used instead, so distinct inputs still map to
///    distinct, stable filenames
///
/// # Examples
///
/// ```
/// use tidepool::record::slugify;
///
/// assert_eq!(slugify("Hotel Panorama & Spa"), "hotel-panorama-spa");
/// assert_eq!(slugify("Почивка в Гърция"), "почивка-в-гърция");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_separator = false;

    for c in text.trim().chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            for lc in c.to_lowercase() {
                slug.push(lc);
            }
        } else {
            pending_separator = true;
        }
    }

    if slug.is_empty() {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let digest = hex::encode(hasher.finalize());
        slug.push_str(&digest[..12]);
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_latin() {
        assert_eq!(slugify("Sunny Beach Resort"), "sunny-beach-resort");
    }

    #[test]
    fn test_punctuation_collapses() {
        assert_eq!(slugify("Rome -- 5 days / 4 nights!"), "rome-5-days-4-nights");
    }

    #[test]
    fn test_cyrillic_preserved() {
        assert_eq!(slugify("Екскурзия до Рим"), "екскурзия-до-рим");
    }

    #[test]
    fn test_no_leading_or_trailing_dash() {
        let slug = slugify("  ...Malta...  ");
        assert_eq!(slug, "malta");
    }

    #[test]
    fn test_empty_input_falls_back_to_digest() {
        let a = slugify("!!!");
        let b = slugify("!!!");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(slugify("!!!"), slugify("???"));
    }

    #[test]
    fn test_filename_safety() {
        let slug = slugify("a/b\\c:d*e?f\"g<h>i|j\0k");
        assert!(!slug.contains(['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0']));
    }

    #[test]
    fn test_stable_across_calls() {
        assert_eq!(slugify("Почивка в Гърция"), slugify("Почивка в Гърция"));
    }
}
