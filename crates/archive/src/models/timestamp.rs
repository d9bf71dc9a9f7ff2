use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;
use time::UtcDateTime;
use time::format_description::well_known::Rfc3339;

/// A point in time with millisecond precision (milliseconds since the Unix
/// epoch).
///
/// Millisecond precision is what gets persisted, so a timestamp survives a
/// round-trip through storage unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);
impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        let millis = UtcDateTime::now().unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }

    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Time elapsed between `earlier` and `self`; zero if `earlier` is later.
    pub fn since(self, earlier: Timestamp) -> Duration {
        let millis = self.0.saturating_sub(earlier.0).max(0);
        Duration::from_millis(millis.unsigned_abs())
    }

    pub fn to_datetime(self) -> Option<UtcDateTime> {
        UtcDateTime::from_unix_timestamp_nanos(i128::from(self.0) * 1_000_000).ok()
    }
}
impl From<UtcDateTime> for Timestamp {
    fn from(value: UtcDateTime) -> Self {
        let millis = value.unix_timestamp_nanos() / 1_000_000;
        Self(i64::try_from(millis).unwrap_or(i64::MAX))
    }
}
impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.to_datetime().and_then(|dt| dt.format(&Rfc3339).ok()) {
            Some(formatted) => f.write_str(&formatted),
            None => write!(f, "@{}ms", self.0),
        }
    }
}
