use koma_archive::models::{MangaId, Timestamp};

/// How far one manga has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub manga_id: MangaId,
    pub current_page_index: usize,
    pub last_read_at: Timestamp,
}
impl ProgressRecord {
    /// Reading percentage shown next to a library entry, rounded to the
    /// nearest whole percent.
    pub fn percent(&self, page_count: usize) -> u32 {
        if page_count == 0 {
            return 0;
        }
        let index = self.current_page_index as u128;
        let count = page_count as u128;
        let rounded = (index * 200 + count) / (count * 2);
        u32::try_from(rounded).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 0)]
    #[case(5, 10, 50)]
    #[case(1, 3, 33)]
    #[case(2, 3, 67)]
    #[case(1, 8, 13)]
    #[case(3, 0, 0)]
    fn test_percent(#[case] index: usize, #[case] count: usize, #[case] expected: u32) {
        let record = ProgressRecord {
            manga_id: MangaId::new("1"),
            current_page_index: index,
            last_read_at: Timestamp::from_millis(0),
        };
        assert_eq!(record.percent(count), expected);
    }
}
