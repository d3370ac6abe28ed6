//! SAT-based dependency resolver.
//!
//! This module implements a CDCL (Conflict-Driven Clause Learning) SAT solver
//! for package dependency resolution over a prepared [`Pool`](crate::pool::Pool).
//!
//! # Architecture
//!
//! - [`JobQueue`]: what the caller wants (install, erase, update, distupgrade, lock)
//! - [`RuleSet`]: clauses generated from dependencies, installed state and jobs
//! - [`Policy`]: preference order between candidates
//! - [`Solver`]: the search itself
//! - [`Transaction`] / [`ProblemSet`]: the result of a solve
//!
//! # Algorithm Overview
//!
//! 1. **Rule Generation**: Convert the reachable part of the pool to clauses
//! 2. **Unit Propagation**: Force decisions from unit clauses (two watched literals)
//! 3. **Decision Making**: Jobs first, then installed packages, then open
//!    requirements, then recommendations
//! 4. **Conflict Analysis**: Learn a clause at the first unique implication point
//! 5. **Backjumping**: Revert to the second highest level of the learned clause
//! 6. **Problem Handling**: At level 1, drop a weak job or record a problem,
//!    disable the involved jobs and restart
//!
//! # Example
//!
//! ```ignore
//! use satsolv::pool::{DepKind, Pool};
//! use satsolv::solver::{JobQueue, Solver};
//!
//! let mut pool = Pool::new();
//! let repo = pool.create_repo("available")?;
//! pool.add_solvable_with(repo, "G", "1.0-1", "noarch", &[])?;
//! let g = pool.intern("G");
//! pool.prepare();
//!
//! let mut jobs = JobQueue::new();
//! jobs.install_name(g);
//!
//! match Solver::new(&pool).solve(&jobs) {
//!     Ok(transaction) => println!("{}", transaction.describe(&pool)),
//!     Err(err) => println!("No solution: {}", err),
//! }
//! ```

mod decisions;
mod job;
mod policy;
mod problem;
mod rule;
mod rule_generator;
mod rule_set;
mod solver;
mod transaction;
mod watch_graph;


pub use decisions::Decisions;
pub use job::{Job, JobCommand, JobQueue};
pub use policy::Policy;
pub use problem::{Problem, ProblemKind, ProblemRule, ProblemSet, Solution};
pub use rule::{Literal, Rule, RuleType};
pub use rule_set::{RuleSet, RuleSetStats};
pub use solver::{Alternative, Solver, SolverStats};
pub use transaction::{Decision, DecisionOp, DecisionReason, Transaction, TransactionSummary};

pub use crate::error::{SolveError, UsageError};
