use std::fmt;

use super::interner::Id;
use super::relation::Relation;
use super::repo::RepoId;

/// Identifier of a solvable within its pool. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SolvableId(pub(crate) u32);

impl SolvableId {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        SolvableId(index as u32 + 1)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl fmt::Display for SolvableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The dependency lists a solvable carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DepKind {
    Provides,
    Requires,
    Conflicts,
    Obsoletes,
    Recommends,
    Suggests,
    Supplements,
    Enhances,
    Freshens,
}

impl DepKind {
    pub const ALL: [DepKind; 9] = [
        DepKind::Provides,
        DepKind::Requires,
        DepKind::Conflicts,
        DepKind::Obsoletes,
        DepKind::Recommends,
        DepKind::Suggests,
        DepKind::Supplements,
        DepKind::Enhances,
        DepKind::Freshens,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DepKind::Provides => "provides",
            DepKind::Requires => "requires",
            DepKind::Conflicts => "conflicts",
            DepKind::Obsoletes => "obsoletes",
            DepKind::Recommends => "recommends",
            DepKind::Suggests => "suggests",
            DepKind::Supplements => "supplements",
            DepKind::Enhances => "enhances",
            DepKind::Freshens => "freshens",
        }
    }
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    pub provides: Vec<Relation>,
    pub requires: Vec<Relation>,
    pub conflicts: Vec<Relation>,
    pub obsoletes: Vec<Relation>,
    pub recommends: Vec<Relation>,
    pub suggests: Vec<Relation>,
    pub supplements: Vec<Relation>,
    pub enhances: Vec<Relation>,
    pub freshens: Vec<Relation>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: DepKind) -> &[Relation] {
        match kind {
            DepKind::Provides => &self.provides,
            DepKind::Requires => &self.requires,
            DepKind::Conflicts => &self.conflicts,
            DepKind::Obsoletes => &self.obsoletes,
            DepKind::Recommends => &self.recommends,
            DepKind::Suggests => &self.suggests,
            DepKind::Supplements => &self.supplements,
            DepKind::Enhances => &self.enhances,
            DepKind::Freshens => &self.freshens,
        }
    }

    pub fn get_mut(&mut self, kind: DepKind) -> &mut Vec<Relation> {
        match kind {
            DepKind::Provides => &mut self.provides,
            DepKind::Requires => &mut self.requires,
            DepKind::Conflicts => &mut self.conflicts,
            DepKind::Obsoletes => &mut self.obsoletes,
            DepKind::Recommends => &mut self.recommends,
            DepKind::Suggests => &mut self.suggests,
            DepKind::Supplements => &mut self.supplements,
            DepKind::Enhances => &mut self.enhances,
            DepKind::Freshens => &mut self.freshens,
        }
    }

    /// Add a relation to one of the lists
    pub fn with(mut self, kind: DepKind, relation: Relation) -> Self {
        self.get_mut(kind).push(relation);
        self
    }

    pub fn is_empty(&self) -> bool {
        DepKind::ALL.iter().all(|&kind| self.get(kind).is_empty())
    }
}

/// One concrete package.
#[derive(Debug, Clone)]
pub struct Solvable {
    pub name: Id,
    pub evr: Id,
    pub arch: Id,
    pub repo: RepoId,
    pub deps: Dependencies,
}

#[cfg(test)]
mod tests {
    use super::*;
    use satsolv_evr::RelOp;

    #[test]
    fn test_solvable_id_index() {
        let id = SolvableId::from_index(0);
        assert_eq!(id.as_u32(), 1);
        assert_eq!(id.index(), 0);
    }

    #[test]
    fn test_dependencies_by_kind() {
        let rel = Relation::new(Id::EMPTY, RelOp::Any, Id::EMPTY);
        let deps = Dependencies::new()
            .with(DepKind::Requires, rel)
            .with(DepKind::Enhances, rel);
        assert_eq!(deps.get(DepKind::Requires).len(), 1);
        assert_eq!(deps.get(DepKind::Enhances).len(), 1);
        assert!(deps.get(DepKind::Provides).is_empty());
        assert!(!deps.is_empty());
        assert!(Dependencies::new().is_empty());
    }
}
