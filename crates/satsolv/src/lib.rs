//! SAT-based package dependency solver
//!
//! Packages ("solvables") are loaded into a [`Pool`], the caller describes
//! the wanted change as a [`JobQueue`] and a [`Solver`] turns it into a
//! [`Transaction`] or a set of [`Problem`]s explaining why it cannot.

pub mod config;
pub mod error;
pub mod pool;
pub mod solver;

pub use config::{ConfigLoader, SolverConfig, SolverFlags};
pub use error::{Result, SolveError, SolvError, UsageError};
pub use pool::{DepKind, Id, Pool, Relation, RepoId, Solvable, SolvableId};
pub use solver::{
    Decision, DecisionOp, DecisionReason, Job, JobCommand, JobQueue, Problem, ProblemKind, ProblemSet, Solver,
    Transaction,
};
