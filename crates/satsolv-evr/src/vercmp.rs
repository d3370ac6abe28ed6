//! Segment-wise comparison of version and release strings

use std::cmp::Ordering;

/// One alphanumeric run of a version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    /// Digits with leading zeros stripped ("" is zero)
    Numeric(&'a str),
    /// ASCII letters
    Alpha(&'a str),
}

/// Splits a version string into numeric and alphabetic runs, skipping separators.
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Segment<'a>> {
        let start = self
            .rest
            .find(|c: char| c.is_ascii_alphanumeric())?;
        let s = &self.rest[start..];

        let first = s.as_bytes()[0];
        if first.is_ascii_digit() {
            let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
            self.rest = &s[end..];
            Some(Segment::Numeric(s[..end].trim_start_matches('0')))
        } else {
            let end = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
            self.rest = &s[end..];
            Some(Segment::Alpha(&s[..end]))
        }
    }
}

/// Compare two version (or release) strings.
///
/// Numeric runs compare as integers of arbitrary size, alphabetic runs compare
/// lexically and a numeric run always beats an alphabetic one. When one side
/// runs out, the other side is greater if its next run is numeric and lesser
/// if it is alphabetic, so `1.0 < 1.0.1` but `1.0beta < 1.0`.
pub fn vercmp(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut left = Segments::new(a);
    let mut right = Segments::new(b);

    loop {
        let ordering = match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (Some(Segment::Numeric(_)), None) => return Ordering::Greater,
            (Some(Segment::Alpha(_)), None) => return Ordering::Less,
            (None, Some(Segment::Numeric(_))) => return Ordering::Less,
            (None, Some(Segment::Alpha(_))) => return Ordering::Greater,
            (Some(Segment::Numeric(x)), Some(Segment::Numeric(y))) => {
                x.len().cmp(&y.len()).then_with(|| x.cmp(y))
            }
            (Some(Segment::Numeric(_)), Some(Segment::Alpha(_))) => Ordering::Greater,
            (Some(Segment::Alpha(_)), Some(Segment::Numeric(_))) => Ordering::Less,
            (Some(Segment::Alpha(x)), Some(Segment::Alpha(y))) => x.cmp(y),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_segments() {
        assert_eq!(vercmp("1.2.3", "1.2.4"), Ordering::Less);
        assert_eq!(vercmp("1.10", "1.9"), Ordering::Greater);
        assert_eq!(vercmp("2", "10"), Ordering::Less);
        assert_eq!(vercmp("1.0", "1.0"), Ordering::Equal);
    }

    #[test]
    fn test_leading_zeros_ignored() {
        assert_eq!(vercmp("1.01", "1.1"), Ordering::Equal);
        assert_eq!(vercmp("1.00", "1.0"), Ordering::Equal);
        assert_eq!(vercmp("007", "7"), Ordering::Equal);
    }

    #[test]
    fn test_large_numbers_do_not_overflow() {
        assert_eq!(
            vercmp("1.123456789012345678901234567890", "1.123456789012345678901234567891"),
            Ordering::Less
        );
    }

    #[test]
    fn test_numeric_beats_alpha() {
        assert_eq!(vercmp("1.0.1", "1.0.a"), Ordering::Greater);
        assert_eq!(vercmp("1a", "11"), Ordering::Less);
    }

    #[test]
    fn test_extra_segments() {
        // Extra numeric segment makes the longer one greater
        assert_eq!(vercmp("1.0.1", "1.0"), Ordering::Greater);
        // Extra alphabetic segment makes the longer one lesser
        assert_eq!(vercmp("1.0beta", "1.0"), Ordering::Less);
        assert_eq!(vercmp("1.0", "1.0rc1"), Ordering::Greater);
    }

    #[test]
    fn test_separators_skipped() {
        assert_eq!(vercmp("1_2", "1.2"), Ordering::Equal);
        assert_eq!(vercmp("1..2", "1.2"), Ordering::Equal);
    }

    #[test]
    fn test_alpha_segments() {
        assert_eq!(vercmp("1.0a", "1.0b"), Ordering::Less);
        assert_eq!(vercmp("1.0abc", "1.0ab"), Ordering::Greater);
    }
}
