//! Epoch:version-release tokens and their ordering

use std::cmp::Ordering;
use std::fmt;

use crate::vercmp::vercmp;

/// How the release part takes part in a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvrCmp {
    /// Total order: a missing release sorts before any release
    Compare,
    /// Relation matching: the release is only compared if both sides carry one
    MatchRelease,
}

/// A parsed `[epoch:]version[-release]` token borrowing from its source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evr<'a> {
    pub epoch: Option<&'a str>,
    pub version: &'a str,
    pub release: Option<&'a str>,
}

impl<'a> Evr<'a> {
    /// Split a token into epoch, version and release.
    ///
    /// Returns `None` for ill-formed tokens (see [`is_well_formed`]).
    pub fn parse(token: &'a str) -> Option<Self> {
        if !is_well_formed(token) {
            return None;
        }

        let (epoch, rest) = match token.split_once(':') {
            Some((epoch, rest)) => (Some(epoch), rest),
            None => (None, token),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((version, release)) => (version, Some(release)),
            None => (rest, None),
        };

        Some(Self {
            epoch,
            version,
            release,
        })
    }

    /// Numeric value of the epoch with leading zeros stripped ("" is zero)
    fn epoch_digits(&self) -> &'a str {
        self.epoch.unwrap_or("0").trim_start_matches('0')
    }

    /// Compare two parsed tokens.
    pub fn compare(&self, other: &Evr<'_>, mode: EvrCmp) -> Ordering {
        self.compare_epoch(other)
            .then_with(|| vercmp(self.version, other.version))
            .then_with(|| compare_release(self.release, other.release, mode))
    }

    fn compare_epoch(&self, other: &Evr<'_>) -> Ordering {
        let a = self.epoch_digits();
        let b = other.epoch_digits();
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }
}

impl fmt::Display for Evr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(epoch) = self.epoch {
            write!(f, "{}:", epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(release) = self.release {
            write!(f, "-{}", release)?;
        }
        Ok(())
    }
}

fn compare_release(a: Option<&str>, b: Option<&str>, mode: EvrCmp) -> Ordering {
    match (a, b, mode) {
        (Some(a), Some(b), _) => vercmp(a, b),
        (_, _, EvrCmp::MatchRelease) => Ordering::Equal,
        (None, None, EvrCmp::Compare) => Ordering::Equal,
        (None, Some(_), EvrCmp::Compare) => Ordering::Less,
        (Some(_), None, EvrCmp::Compare) => Ordering::Greater,
    }
}

/// Check whether a token can be ordered as a version.
///
/// A token is ill-formed if it is empty, contains whitespace or control
/// characters, has an empty version part, or carries a non-numeric epoch.
pub fn is_well_formed(token: &str) -> bool {
    if token.is_empty() || token.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let rest = match token.split_once(':') {
        Some((epoch, rest)) => {
            if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            rest
        }
        None => token,
    };

    !rest.is_empty() && !rest.contains(':') && !rest.starts_with('-') && !rest.ends_with('-')
}

/// Compare two EVR tokens.
///
/// Ill-formed tokens sort below every well-formed token and bytewise among
/// themselves, so the result is a total order over all strings.
pub fn compare_evr(a: &str, b: &str, mode: EvrCmp) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    match (Evr::parse(a), Evr::parse(b)) {
        (Some(x), Some(y)) => x.compare(&y, mode),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Compare two EVR tokens for relation matching.
///
/// `a` is the provided EVR and `b` the required one. The release only counts
/// when both sides have one. With `promote_epoch` a requirement without epoch
/// matches a provider of any epoch; a requirement with an epoch still needs
/// epoch 0 from a provider without one.
pub fn evr_matches(a: &str, b: &str, promote_epoch: bool) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    match (Evr::parse(a), Evr::parse(b)) {
        (Some(x), Some(y)) => {
            let epoch = if promote_epoch && x.epoch.is_some() && y.epoch.is_none() {
                Ordering::Equal
            } else {
                x.compare_epoch(&y)
            };
            epoch
                .then_with(|| vercmp(x.version, y.version))
                .then_with(|| compare_release(x.release, y.release, EvrCmp::MatchRelease))
        }
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let evr = Evr::parse("2:1.4.5-3.el7").unwrap();
        assert_eq!(evr.epoch, Some("2"));
        assert_eq!(evr.version, "1.4.5");
        assert_eq!(evr.release, Some("3.el7"));
        assert_eq!(evr.to_string(), "2:1.4.5-3.el7");
    }

    #[test]
    fn test_parse_release_split_at_last_dash() {
        let evr = Evr::parse("1.0-rc1-2").unwrap();
        assert_eq!(evr.version, "1.0-rc1");
        assert_eq!(evr.release, Some("2"));
    }

    #[test]
    fn test_parse_ill_formed() {
        assert!(Evr::parse("").is_none());
        assert!(Evr::parse("1.0 beta").is_none());
        assert!(Evr::parse("x:1.0").is_none());
        assert!(Evr::parse("1:").is_none());
        assert!(Evr::parse("-1").is_none());
    }

    #[test]
    fn test_epoch_first() {
        assert_eq!(compare_evr("1:1.0", "2.0", EvrCmp::Compare), Ordering::Greater);
        assert_eq!(compare_evr("0:2.0", "2.0", EvrCmp::Compare), Ordering::Equal);
        assert_eq!(compare_evr("10:1", "9:5", EvrCmp::Compare), Ordering::Greater);
    }

    #[test]
    fn test_release_modes() {
        assert_eq!(compare_evr("1.0-1", "1.0-2", EvrCmp::Compare), Ordering::Less);
        assert_eq!(compare_evr("1.0", "1.0-2", EvrCmp::Compare), Ordering::Less);
        assert_eq!(compare_evr("1.0", "1.0-2", EvrCmp::MatchRelease), Ordering::Equal);
        assert_eq!(compare_evr("1.0-3", "1.0-2", EvrCmp::MatchRelease), Ordering::Greater);
    }

    #[test]
    fn test_ill_formed_sorts_first() {
        assert_eq!(compare_evr("", "0", EvrCmp::Compare), Ordering::Less);
        assert_eq!(compare_evr("bad token", "0.0.1", EvrCmp::Compare), Ordering::Less);
        assert_eq!(compare_evr("bad token", "bad token", EvrCmp::Compare), Ordering::Equal);
        assert_eq!(compare_evr("a b", "c d", EvrCmp::Compare), Ordering::Less);
    }

    #[test]
    fn test_transitivity_sample() {
        let tokens = [
            "", "x y", "0.9", "1.0beta", "1.0", "1.0-1", "1.0-2", "1.0.1", "1:0.1", "2:0",
        ];
        for a in tokens {
            assert_eq!(compare_evr(a, a, EvrCmp::Compare), Ordering::Equal);
            for b in tokens {
                for c in tokens {
                    let ab = compare_evr(a, b, EvrCmp::Compare);
                    let bc = compare_evr(b, c, EvrCmp::Compare);
                    if ab == Ordering::Less && bc == Ordering::Less {
                        assert_eq!(compare_evr(a, c, EvrCmp::Compare), Ordering::Less, "{a} < {b} < {c}");
                    }
                }
                assert_eq!(compare_evr(a, b, EvrCmp::Compare), compare_evr(b, a, EvrCmp::Compare).reverse());
            }
        }
    }

    #[test]
    fn test_promote_epoch() {
        assert_eq!(evr_matches("3:1.0", "1.0", true), Ordering::Equal);
        assert_eq!(evr_matches("3:1.0", "1.0", false), Ordering::Greater);
        assert_eq!(evr_matches("2:1.0", "3:1.0", true), Ordering::Less);
    }

    #[test]
    fn test_promote_epoch_is_one_sided() {
        // Provider without epoch against a requirement with one
        assert_eq!(evr_matches("1.0", "3:1.0", true), Ordering::Less);
        assert_eq!(evr_matches("1.0", "0:1.0", true), Ordering::Equal);
    }
}
