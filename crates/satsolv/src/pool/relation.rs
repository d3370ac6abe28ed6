//! Relations and the relation matcher

use satsolv_evr::{evr_matches, RelOp};

use super::interner::Id;
use super::solvable::SolvableId;
use super::Pool;

/// A dependency: a name with an optional version constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Relation {
    pub name: Id,
    pub op: RelOp,
    pub evr: Id,
}

impl Relation {
    pub fn new(name: Id, op: RelOp, evr: Id) -> Self {
        if op == RelOp::Any {
            return Self::name_only(name);
        }
        Self { name, op, evr }
    }

    pub fn name_only(name: Id) -> Self {
        Self {
            name,
            op: RelOp::Any,
            evr: Id::EMPTY,
        }
    }

    pub fn is_versioned(&self) -> bool {
        self.op != RelOp::Any
    }
}

impl Pool {
    /// Check whether the range of `provide` intersects the range of `dep`.
    pub fn relations_intersect(&self, provide: &Relation, dep: &Relation) -> bool {
        if provide.name != dep.name {
            return false;
        }
        if !provide.is_versioned() || !dep.is_versioned() {
            return true;
        }

        let ordering = evr_matches(
            self.id_str(provide.evr),
            self.id_str(dep.evr),
            self.promote_epoch(),
        );
        provide.op.intersects(dep.op, ordering)
    }

    /// Check whether a solvable satisfies a relation through its own
    /// name and version or through one of its provides.
    pub fn matches(&self, id: SolvableId, relation: &Relation) -> bool {
        let Some(solvable) = self.solvable(id) else {
            return false;
        };

        let own = Relation::new(solvable.name, RelOp::Eq, solvable.evr);
        if self.relations_intersect(&own, relation) {
            return true;
        }

        solvable
            .deps
            .provides
            .iter()
            .any(|provide| self.relations_intersect(provide, relation))
    }

    /// Match a relation against the name and version of a solvable only,
    /// ignoring its provides. Used for obsoletes.
    pub fn matches_name_evr(&self, id: SolvableId, relation: &Relation) -> bool {
        let Some(solvable) = self.solvable(id) else {
            return false;
        };
        if solvable.name != relation.name {
            return false;
        }
        if !relation.is_versioned() {
            return true;
        }

        let ordering = evr_matches(
            self.id_str(solvable.evr),
            self.id_str(relation.evr),
            self.promote_epoch(),
        );
        relation.op.accepts(ordering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{DepKind, Pool};

    fn pool_with(entries: Vec<(&str, &str, Vec<(DepKind, &str)>)>) -> (Pool, Vec<SolvableId>) {
        let mut pool = Pool::new();
        let repo = pool.create_repo("test").unwrap();
        let ids = entries
            .iter()
            .map(|(name, evr, deps)| pool.add_solvable_with(repo, name, evr, "noarch", deps).unwrap())
            .collect();
        pool.prepare();
        (pool, ids)
    }

    #[test]
    fn test_name_only_matches_any_version() {
        let (mut pool, ids) = pool_with(vec![("A", "1.0-1", vec![])]);
        let rel = pool.parse_relation("A").unwrap();
        assert!(pool.matches(ids[0], &rel));
        let other = pool.parse_relation("B").unwrap();
        assert!(!pool.matches(ids[0], &other));
    }

    #[test]
    fn test_versioned_match_against_own_evr() {
        let (mut pool, ids) = pool_with(vec![("A", "1.5-2", vec![])]);
        for (dep, expected) in [
            ("A >= 1.0", true),
            ("A > 1.5", false),
            ("A = 1.5", true),
            ("A = 1.5-2", true),
            ("A = 1.5-3", false),
            ("A < 2", true),
            ("A <= 1.4", false),
        ] {
            let rel = pool.parse_relation(dep).unwrap();
            assert_eq!(pool.matches(ids[0], &rel), expected, "{dep}");
        }
    }

    #[test]
    fn test_match_through_provides() {
        let (mut pool, ids) = pool_with(vec![("A", "1.0", vec![(DepKind::Provides, "virt = 3")])]);
        let ok = pool.parse_relation("virt >= 2").unwrap();
        let bad = pool.parse_relation("virt > 3").unwrap();
        assert!(pool.matches(ids[0], &ok));
        assert!(!pool.matches(ids[0], &bad));
    }

    #[test]
    fn test_unversioned_provide_matches_versioned_dep() {
        let (mut pool, ids) = pool_with(vec![("A", "1.0", vec![(DepKind::Provides, "virt")])]);
        let rel = pool.parse_relation("virt >= 7").unwrap();
        assert!(pool.matches(ids[0], &rel));
    }

    #[test]
    fn test_obsoletes_ignore_provides() {
        let (mut pool, ids) = pool_with(vec![("A", "1.0", vec![(DepKind::Provides, "old")])]);
        let rel = pool.parse_relation("old").unwrap();
        assert!(pool.matches(ids[0], &rel));
        assert!(!pool.matches_name_evr(ids[0], &rel));
        let own = pool.parse_relation("A < 2").unwrap();
        assert!(pool.matches_name_evr(ids[0], &own));
    }

    #[test]
    fn test_promote_epoch() {
        let (mut pool, ids) = pool_with(vec![("A", "2:1.0", vec![])]);
        let rel = pool.parse_relation("A = 1.0").unwrap();
        assert!(!pool.matches(ids[0], &rel));
        pool.set_promote_epoch(true);
        assert!(pool.matches(ids[0], &rel));
    }

    #[test]
    fn test_promote_epoch_needs_provider_epoch() {
        let (mut pool, ids) = pool_with(vec![("A", "1.0", vec![])]);
        let rel = pool.parse_relation("A = 2:1.0").unwrap();
        pool.set_promote_epoch(true);
        assert!(!pool.matches(ids[0], &rel));
        assert!(!pool.matches_name_evr(ids[0], &rel));
    }
}
