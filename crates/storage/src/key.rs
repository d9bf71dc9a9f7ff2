//! Key validation.
//!
//! Keys are `:`-separated segments (`manga-reader:library`). Backends map
//! segments onto their own layout (the local backend uses one directory per
//! segment), so a segment must never be able to escape that layout.

use crate::error::{ErrorKind, Result};

/// Separator between key segments (and between a namespace and its keys).
pub const SEPARATOR: char = ':';
const MAX_KEY_LENGTH: usize = 255;

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// Validates a storage key.
///
/// # Returns
/// Returns the key if valid, or [`InvalidKey`](crate::error::ErrorKind::InvalidKey)
/// if invalid.
///
/// # Examples
///
/// ```
/// use koma_storage::validate_key;
/// // Valid keys
/// assert!(validate_key("manga-reader:library").is_ok());
/// assert!(validate_key("settings_v1.theme").is_ok());
/// // Invalid keys
/// assert!(validate_key("").is_err());
/// assert!(validate_key("ns::library").is_err());
/// assert!(validate_key("ns:..").is_err());
/// assert!(validate_key("ns/library").is_err());
/// ```
pub fn validate(key: impl AsRef<str>) -> Result<String> {
    let key = key.as_ref();
    if key.len() > MAX_KEY_LENGTH || !key.split(SEPARATOR).all(valid_segment) {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key.to_string())
}

/// Segment-wise prefix match: `a:b` is under `a`, `ab:c` is not.
pub(crate) fn has_prefix(key: &str, prefix: &str) -> bool {
    key == prefix || key.strip_prefix(prefix).is_some_and(|rest| rest.starts_with(SEPARATOR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("library")]
    #[case("manga-reader:library")]
    #[case("a:b:c")]
    #[case("v1.progress_backup")]
    fn test_valid_keys(#[case] key: &str) {
        assert_eq!(validate(key).unwrap(), key);
    }

    #[rstest]
    #[case("")]
    #[case(":")]
    #[case("ns:")]
    #[case(":library")]
    #[case("ns::library")]
    #[case("ns:.")]
    #[case("ns:..:etc")]
    #[case("../etc/passwd")]
    #[case("ns:with space")]
    #[case("a\0b")]
    fn test_invalid_keys(#[case] key: &str) {
        let err = validate(key).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[test]
    fn test_too_long() {
        assert!(validate("k".repeat(MAX_KEY_LENGTH)).is_ok());
        assert!(validate("k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_has_prefix() {
        assert!(has_prefix("ns:library", "ns"));
        assert!(has_prefix("ns", "ns"));
        assert!(has_prefix("ns:a:b", "ns:a"));
        assert!(!has_prefix("nsx:library", "ns"));
        assert!(!has_prefix("n", "ns"));
    }
}
