//! Epoch:version-release handling for package dependency resolution
//!
//! This crate provides the version ordering used by the solver, the relation
//! comparison operators, and parsing of textual dependencies such as
//! `glibc >= 2:2.17-55`.

mod dependency;
mod evr;
mod operator;
mod vercmp;

pub use dependency::{parse_dependency, EvrError, ParsedDependency};
pub use evr::{compare_evr, evr_matches, is_well_formed, Evr, EvrCmp};
pub use operator::RelOp;
pub use vercmp::vercmp;
