use std::fmt;

use super::solvable::SolvableId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId(pub(crate) u32);

impl RepoId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, ordered group of solvables.
///
/// Solvables only store the id of their repository; the repository keeps the
/// ids of its solvables in insertion order.
#[derive(Debug, Clone)]
pub struct Repo {
    id: RepoId,
    name: String,
    priority: i32,
    solvables: Vec<SolvableId>,
}

impl Repo {
    pub(crate) fn new(id: RepoId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            priority: 0,
            solvables: Vec::new(),
        }
    }

    pub fn id(&self) -> RepoId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Higher priority repositories win free choices before version comparison
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn solvables(&self) -> &[SolvableId] {
        &self.solvables
    }

    pub(crate) fn push(&mut self, id: SolvableId) {
        self.solvables.push(id);
    }

    pub fn len(&self) -> usize {
        self.solvables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvables.is_empty()
    }
}
