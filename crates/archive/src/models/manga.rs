use super::Timestamp;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicI64, Ordering};

/// Last id issued by [`MangaId::generate`] in this process.
static LAST_ISSUED: AtomicI64 = AtomicI64::new(i64::MIN);

/// Identifier of an imported archive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MangaId(String);
impl MangaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Issue a time-based id (milliseconds since the epoch).
    ///
    /// Ids are strictly increasing within a process: an import landing in the
    /// same millisecond as the previous one gets the next millisecond instead
    /// of a duplicate.
    pub fn generate(now: Timestamp) -> Self {
        let wanted = now.as_millis();
        let previous = LAST_ISSUED
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(wanted.max(last.saturating_add(1))))
            // The closure always returns `Some`.
            .unwrap_or_else(|last| last);
        Self(wanted.max(previous.saturating_add(1)).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Display for MangaId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}
impl From<&str> for MangaId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
impl From<String> for MangaId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
impl AsRef<str> for MangaId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An imported archive as the library knows it.
///
/// Created once per successful extraction and never modified afterwards;
/// importing the same file again creates a new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangaRecord {
    id: MangaId,
    name: String,
    page_count: usize,
    added_at: Timestamp,
}
impl MangaRecord {
    pub fn new(id: impl Into<MangaId>, name: impl Into<String>, page_count: usize, added_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            page_count,
            added_at,
        }
    }

    pub fn id(&self) -> &MangaId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn added_at(&self) -> Timestamp {
        self.added_at
    }

    /// Index of the last page, `None` for a record without pages (which
    /// extraction never produces, but a stored record could claim).
    pub fn last_page(&self) -> Option<usize> {
        self.page_count.checked_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique_within_same_millisecond() {
        let now = Timestamp::from_millis(1_700_000_000_000);
        let first = MangaId::generate(now);
        let second = MangaId::generate(now);
        assert_ne!(first, second);
        let first: i64 = first.as_str().parse().unwrap();
        let second: i64 = second.as_str().parse().unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_generate_is_time_based() {
        // Far in the future so no other test in the process has issued a later id.
        let now = Timestamp::from_millis(4_000_000_000_000);
        assert_eq!(MangaId::generate(now).as_str(), "4000000000000");
    }

    #[test]
    fn test_last_page() {
        let record = MangaRecord::new("1", "Vol. 1", 5, Timestamp::from_millis(0));
        assert_eq!(record.last_page(), Some(4));
        let empty = MangaRecord::new("2", "Nothing", 0, Timestamp::from_millis(0));
        assert_eq!(empty.last_page(), None);
    }
}
