use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::operator::RelOp;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvrError {
    #[error("Invalid dependency string: {0}")]
    InvalidDependency(String),

    #[error("Invalid relation operator: {0}")]
    InvalidOperator(String),
}

lazy_static! {
    static ref DEPENDENCY_REGEX: Regex =
        Regex::new(r"^\s*([^\s<>=!]+)\s*(?:(==|=<|=>|<=|>=|=|<|>)\s*(\S+))?\s*$").unwrap();
}

/// A textual dependency split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDependency {
    pub name: String,
    pub op: RelOp,
    pub evr: Option<String>,
}

/// Parse a dependency such as `foo`, `foo >= 1.2` or `foo=2:1.0-3`.
pub fn parse_dependency(input: &str) -> Result<ParsedDependency, EvrError> {
    let caps = DEPENDENCY_REGEX
        .captures(input)
        .ok_or_else(|| EvrError::InvalidDependency(input.to_string()))?;

    let name = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| EvrError::InvalidDependency(input.to_string()))?;

    let op = match caps.get(2) {
        Some(m) => m.as_str().parse()?,
        None => RelOp::Any,
    };

    let evr = caps.get(3).map(|m| m.as_str().to_string());

    Ok(ParsedDependency { name, op, evr })
}
