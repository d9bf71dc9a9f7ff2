//! Natural ("human") ordering of archive entry paths.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}
impl<'a> Chunk<'a> {
    fn as_str(&self) -> &'a str {
        match self {
            Chunk::Digits(s) | Chunk::Text(s) => s,
        }
    }
}

/// Splits a string into alternating runs of ASCII digits and everything else.
struct Chunks<'a> {
    rest: &'a str,
}
impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        Some(if digits { Chunk::Digits(head) } else { Chunk::Text(head) })
    }
}

/// Compare two runs of digits by their integer value without parsing them, so
/// arbitrarily long runs can't overflow.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Natural ordering: corresponding runs of digits compare as integers,
/// everything else compares as literal text.
///
/// When two strings are equal under that rule (`"p01"` and `"p1"`) the
/// literal comparison decides, so the ordering stays total and a sort over
/// archive entries is deterministic.
///
/// ```
/// use koma_archive::natural_cmp;
/// use std::cmp::Ordering;
///
/// assert_eq!(natural_cmp("page2.jpg", "page10.jpg"), Ordering::Less);
/// assert_eq!(natural_cmp("b.png", "a.jpg"), Ordering::Greater);
/// ```
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks { rest: a };
    let mut right = Chunks { rest: b };
    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(l)), Some(Chunk::Digits(r))) => cmp_digits(l, r),
            (Some(l), Some(r)) => l.as_str().cmp(r.as_str()),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("page2.jpg", "page10.jpg", Ordering::Less)]
    #[case("page10.jpg", "page2.jpg", Ordering::Greater)]
    #[case("a.jpg", "b.png", Ordering::Less)]
    #[case("c2.jpg", "c10.jpg", Ordering::Less)]
    #[case("ch1/p9.png", "ch1/p10.png", Ordering::Less)]
    #[case("ch2/p1.png", "ch10/p1.png", Ordering::Less)]
    #[case("001.jpg", "1.jpg", Ordering::Less)]
    #[case("1.jpg", "1.jpg", Ordering::Equal)]
    #[case("page", "page1", Ordering::Less)]
    #[case("99999999999999999999999.png", "100000000000000000000000.png", Ordering::Less)]
    fn test_natural_cmp(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(natural_cmp(a, b), expected);
    }

    #[test]
    fn test_sort_mixed_names() {
        let mut names = vec!["b.png", "a.jpg", "c10.jpg", "c2.jpg"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, ["a.jpg", "b.png", "c2.jpg", "c10.jpg"]);
    }

    #[test]
    fn test_chunks() {
        let chunks: Vec<_> = Chunks { rest: "ch12-p3.jpg" }.collect();
        assert_eq!(
            chunks,
            [Chunk::Text("ch"), Chunk::Digits("12"), Chunk::Text("-p"), Chunk::Digits("3"), Chunk::Text(".jpg")]
        );
    }
}
