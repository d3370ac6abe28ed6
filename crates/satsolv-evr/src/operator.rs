//! Relation comparison operators

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::dependency::EvrError;

/// The comparison operator of a versioned relation.
///
/// `Any` is the unversioned form (`name` without an operator).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RelOp {
    #[default]
    Any,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelOp::Any => "",
            RelOp::Eq => "=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }

    pub fn has_lt(&self) -> bool {
        matches!(self, RelOp::Lt | RelOp::Le)
    }

    pub fn has_gt(&self) -> bool {
        matches!(self, RelOp::Gt | RelOp::Ge)
    }

    pub fn has_eq(&self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Le | RelOp::Ge)
    }

    /// Check whether `ordering` (left EVR compared to right EVR) satisfies
    /// `left <op> right`.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match ordering {
            _ if *self == RelOp::Any => true,
            Ordering::Less => self.has_lt(),
            Ordering::Equal => self.has_eq(),
            Ordering::Greater => self.has_gt(),
        }
    }

    /// Check whether the range `self evr_a` intersects the range `other evr_b`,
    /// given `ordering` = evr_a compared to evr_b.
    pub fn intersects(&self, other: RelOp, ordering: Ordering) -> bool {
        if *self == RelOp::Any || other == RelOp::Any {
            return true;
        }

        // Both ranges open towards the same end
        if (self.has_lt() && other.has_lt()) || (self.has_gt() && other.has_gt()) {
            return true;
        }

        match ordering {
            Ordering::Equal => self.has_eq() && other.has_eq(),
            Ordering::Less => self.has_gt() || other.has_lt(),
            Ordering::Greater => self.has_lt() || other.has_gt(),
        }
    }
}

impl FromStr for RelOp {
    type Err = EvrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(RelOp::Any),
            "=" | "==" => Ok(RelOp::Eq),
            "<" => Ok(RelOp::Lt),
            "<=" | "=<" => Ok(RelOp::Le),
            ">" => Ok(RelOp::Gt),
            ">=" | "=>" => Ok(RelOp::Ge),
            _ => Err(EvrError::InvalidOperator(s.to_string())),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operators() {
        assert_eq!("".parse::<RelOp>().unwrap(), RelOp::Any);
        assert_eq!("==".parse::<RelOp>().unwrap(), RelOp::Eq);
        assert_eq!("<=".parse::<RelOp>().unwrap(), RelOp::Le);
        assert_eq!(">".parse::<RelOp>().unwrap(), RelOp::Gt);
        assert!("<>".parse::<RelOp>().is_err());
    }

    #[test]
    fn test_accepts() {
        assert!(RelOp::Ge.accepts(Ordering::Equal));
        assert!(RelOp::Ge.accepts(Ordering::Greater));
        assert!(!RelOp::Ge.accepts(Ordering::Less));
        assert!(!RelOp::Lt.accepts(Ordering::Equal));
        assert!(RelOp::Any.accepts(Ordering::Equal));
        assert!(RelOp::Any.accepts(Ordering::Less));
    }

    #[test]
    fn test_intersects() {
        // provides = 2 against requires >= 1
        assert!(RelOp::Eq.intersects(RelOp::Ge, Ordering::Greater));
        // provides = 1 against requires >= 2
        assert!(!RelOp::Eq.intersects(RelOp::Ge, Ordering::Less));
        // provides < 2 against requires > 1
        assert!(RelOp::Lt.intersects(RelOp::Gt, Ordering::Greater));
        // provides < 1 against requires > 2
        assert!(!RelOp::Lt.intersects(RelOp::Gt, Ordering::Less));
        // provides <= 1 against requires >= 1
        assert!(RelOp::Le.intersects(RelOp::Ge, Ordering::Equal));
        assert!(!RelOp::Lt.intersects(RelOp::Ge, Ordering::Equal));
        assert!(RelOp::Any.intersects(RelOp::Lt, Ordering::Greater));
    }
}
