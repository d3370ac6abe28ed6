use satsolv_evr::EvrError;
use thiserror::Error;

use crate::solver::ProblemSet;

#[derive(Error, Debug)]
pub enum SolvError {
    // Pool setup errors
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    #[error("Pool is prepared, no more repositories or solvables can be added")]
    PoolFrozen,

    #[error("Pool is not prepared, call prepare() first")]
    NotPrepared,

    #[error("Unknown repository: {0}")]
    UnknownRepository(u32),

    #[error("Unknown solvable: {0}")]
    UnknownSolvable(u32),

    // Dependency parsing errors
    #[error("Invalid dependency: {0}")]
    InvalidDependency(#[from] EvrError),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SolvError>;

/// Caller mistakes detected before the search starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("Pool is not prepared, call prepare() before solving")]
    NotPrepared,

    #[error("Job queue is empty")]
    EmptyJobQueue,

    #[error("Invalid job #{index}: {reason}")]
    InvalidJob { index: usize, reason: String },
}

/// Why `Solver::solve` produced no transaction
#[derive(Error, Debug, Clone)]
pub enum SolveError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("{} problem(s) prevent a solution", .0.len())]
    Unsolvable(ProblemSet),

    /// The search reached a state its invariants rule out
    #[error("Internal solver error: {0}")]
    Internal(String),
}

impl SolveError {
    /// The problems found, if the request was unsolvable
    pub fn problems(&self) -> Option<&ProblemSet> {
        match self {
            SolveError::Unsolvable(problems) => Some(problems),
            SolveError::Usage(_) | SolveError::Internal(_) => None,
        }
    }
}
