//! The shared universe of one resolution session.
//!
//! A [`Pool`] owns the string interner, every [`Solvable`] and every
//! [`Repo`]. Solvables refer to their repository by [`RepoId`] and callers
//! look everything up by id, so there are no back-pointers.
//!
//! The pool follows a single-writer / multiple-reader contract: load all
//! repositories, call [`Pool::prepare`], then share `&Pool` with any number
//! of solvers. Structural mutation after `prepare()` is refused.

mod arch;
mod interner;
mod relation;
mod repo;
mod solvable;
mod whatprovides;

use std::cmp::Ordering;

use satsolv_evr::{compare_evr, parse_dependency, EvrCmp, RelOp};

use crate::config::SolverConfig;
use crate::error::{Result, SolvError};

pub use arch::{ArchPolicy, NOARCH};
pub use interner::{Id, Interner};
pub use relation::Relation;
pub use repo::{Repo, RepoId};
pub use solvable::{DepKind, Dependencies, Solvable, SolvableId};
pub use whatprovides::WhatProvides;

#[derive(Debug, Clone, Default)]
pub struct Pool {
    interner: Interner,
    solvables: Vec<Solvable>,
    repos: Vec<Repo>,
    arch: ArchPolicy,
    installed: Option<RepoId>,
    promote_epoch: bool,
    whatprovides: Option<WhatProvides>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string
    pub fn intern(&mut self, s: &str) -> Id {
        self.interner.intern(s)
    }

    /// Look up an already interned string
    pub fn lookup_id(&self, s: &str) -> Option<Id> {
        self.interner.lookup(s)
    }

    pub fn id_str(&self, id: Id) -> &str {
        self.interner.resolve(id)
    }

    pub(crate) fn is_known_id(&self, id: Id) -> bool {
        self.interner.contains(id)
    }

    /// Set the target architecture. Must happen before `prepare()`.
    pub fn set_arch(&mut self, arch: &str) -> Result<()> {
        self.ensure_mutable()?;
        self.arch = ArchPolicy::new(arch)?;
        log::debug!("Pool architecture set to {}", arch);
        Ok(())
    }

    pub fn arch(&self) -> Option<&str> {
        self.arch.target()
    }

    pub fn arch_policy(&self) -> &ArchPolicy {
        &self.arch
    }

    pub fn set_promote_epoch(&mut self, promote: bool) {
        self.promote_epoch = promote;
    }

    pub fn promote_epoch(&self) -> bool {
        self.promote_epoch
    }

    /// Apply the pool-level parts of a configuration
    pub fn apply_config(&mut self, config: &SolverConfig) -> Result<()> {
        if let Some(arch) = &config.arch {
            if self.arch() != Some(arch.as_str()) {
                self.set_arch(arch)?;
            }
        }
        self.set_promote_epoch(config.promote_epoch);
        Ok(())
    }

    pub fn create_repo(&mut self, name: impl Into<String>) -> Result<RepoId> {
        self.ensure_mutable()?;
        let id = RepoId(self.repos.len() as u32);
        self.repos.push(Repo::new(id, name));
        Ok(id)
    }

    pub fn repo(&self, id: RepoId) -> Option<&Repo> {
        self.repos.get(id.0 as usize)
    }

    pub fn repo_mut(&mut self, id: RepoId) -> Option<&mut Repo> {
        self.repos.get_mut(id.0 as usize)
    }

    pub fn repos(&self) -> impl Iterator<Item = &Repo> {
        self.repos.iter()
    }

    /// Mark a repository as the installed system
    pub fn set_installed(&mut self, repo: RepoId) -> Result<()> {
        if self.repo(repo).is_none() {
            return Err(SolvError::UnknownRepository(repo.0));
        }
        self.installed = Some(repo);
        Ok(())
    }

    pub fn installed(&self) -> Option<RepoId> {
        self.installed
    }

    /// Add a solvable with already interned dependencies
    pub fn add_solvable(
        &mut self,
        repo: RepoId,
        name: &str,
        evr: &str,
        arch: &str,
        deps: Dependencies,
    ) -> Result<SolvableId> {
        self.ensure_mutable()?;
        if self.repo(repo).is_none() {
            return Err(SolvError::UnknownRepository(repo.0));
        }

        let solvable = Solvable {
            name: self.interner.intern(name),
            evr: self.interner.intern(evr),
            arch: self.interner.intern(arch),
            repo,
            deps,
        };

        let id = SolvableId::from_index(self.solvables.len());
        self.solvables.push(solvable);
        if let Some(repo) = self.repo_mut(repo) {
            repo.push(id);
        }
        Ok(id)
    }

    /// Add a solvable, parsing textual dependencies such as `("B >= 1.0", Requires)`
    pub fn add_solvable_with(
        &mut self,
        repo: RepoId,
        name: &str,
        evr: &str,
        arch: &str,
        deps: &[(DepKind, &str)],
    ) -> Result<SolvableId> {
        let mut parsed = Dependencies::new();
        for &(kind, text) in deps {
            let relation = self.parse_relation(text)?;
            parsed.get_mut(kind).push(relation);
        }
        self.add_solvable(repo, name, evr, arch, parsed)
    }

    /// Build a relation from parts
    pub fn rel(&mut self, name: &str, op: RelOp, evr: &str) -> Relation {
        let name = self.interner.intern(name);
        if op == RelOp::Any {
            return Relation::name_only(name);
        }
        let evr = self.interner.intern(evr);
        Relation::new(name, op, evr)
    }

    /// Parse and intern a relation such as `glibc >= 2.17`
    pub fn parse_relation(&mut self, text: &str) -> Result<Relation> {
        let dep = parse_dependency(text)?;
        let evr = dep.evr.as_deref().unwrap_or("");
        Ok(self.rel(&dep.name, dep.op, evr))
    }

    /// Build the provides index. Calling it again rebuilds the same index.
    pub fn prepare(&mut self) {
        let index = WhatProvides::build(&self.solvables);
        log::debug!(
            "Prepared pool: {} solvables, {} repositories, {} provided names",
            self.solvables.len(),
            self.repos.len(),
            index.len()
        );
        self.whatprovides = Some(index);
    }

    pub fn is_prepared(&self) -> bool {
        self.whatprovides.is_some()
    }

    fn ensure_mutable(&self) -> Result<()> {
        if self.is_prepared() {
            return Err(SolvError::PoolFrozen);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.solvables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solvables.is_empty()
    }

    pub fn solvable(&self, id: SolvableId) -> Option<&Solvable> {
        if id.0 == 0 {
            return None;
        }
        self.solvables.get(id.index())
    }

    pub fn solvable_ids(&self) -> impl Iterator<Item = SolvableId> {
        (0..self.solvables.len()).map(SolvableId::from_index)
    }

    pub fn is_installed(&self, id: SolvableId) -> bool {
        match (self.solvable(id), self.installed) {
            (Some(s), Some(installed)) => s.repo == installed,
            _ => false,
        }
    }

    /// Check whether the architecture of a solvable is compatible with the pool
    pub fn installable(&self, id: SolvableId) -> bool {
        self.arch_score(id).is_some()
    }

    pub fn arch_score(&self, id: SolvableId) -> Option<u32> {
        let solvable = self.solvable(id)?;
        self.arch.score(self.id_str(solvable.arch))
    }

    /// Installable or already installed
    pub(crate) fn considered(&self, id: SolvableId) -> bool {
        self.installable(id) || self.is_installed(id)
    }

    pub fn repo_priority(&self, id: SolvableId) -> i32 {
        self.solvable(id)
            .and_then(|s| self.repo(s.repo))
            .map(|r| r.priority())
            .unwrap_or(0)
    }

    /// All considered solvables satisfying a relation
    pub fn what_provides(&self, relation: &Relation) -> Result<Vec<SolvableId>> {
        if !self.is_prepared() {
            return Err(SolvError::NotPrepared);
        }
        Ok(self.providers(relation))
    }

    pub(crate) fn providers(&self, relation: &Relation) -> Vec<SolvableId> {
        let Some(index) = &self.whatprovides else {
            return Vec::new();
        };
        index
            .get(relation.name)
            .iter()
            .copied()
            .filter(|&id| self.considered(id) && self.matches(id, relation))
            .collect()
    }

    /// Considered solvables carrying exactly this name
    pub(crate) fn same_name(&self, name: Id) -> Vec<SolvableId> {
        let Some(index) = &self.whatprovides else {
            return Vec::new();
        };
        index
            .get(name)
            .iter()
            .copied()
            .filter(|&id| self.considered(id) && self.solvable(id).map(|s| s.name) == Some(name))
            .collect()
    }

    pub(crate) fn whatprovides_index(&self) -> Option<&WhatProvides> {
        self.whatprovides.as_ref()
    }

    /// Order two solvables by preference: better architecture, higher
    /// repository priority, higher version, lower id. `Less` means `a` is better.
    pub fn compare_preference(&self, a: SolvableId, b: SolvableId) -> Ordering {
        self.compare_rank(a, b).then_with(|| a.cmp(&b))
    }

    /// Preference without the final id tie-break
    pub(crate) fn compare_rank(&self, a: SolvableId, b: SolvableId) -> Ordering {
        let score = |id| self.arch_score(id).unwrap_or(u32::MAX);
        score(a)
            .cmp(&score(b))
            .then_with(|| self.repo_priority(b).cmp(&self.repo_priority(a)))
            .then_with(|| self.compare_evr_of(b, a))
    }

    /// Compare the versions of two solvables
    pub fn compare_evr_of(&self, a: SolvableId, b: SolvableId) -> Ordering {
        match (self.solvable(a), self.solvable(b)) {
            (Some(x), Some(y)) => compare_evr(self.id_str(x.evr), self.id_str(y.evr), EvrCmp::Compare),
            _ => a.cmp(&b),
        }
    }

    /// The best installable solvable with the given name, optionally
    /// restricted to one repository
    pub fn find(&self, name: &str, repo: Option<RepoId>) -> Option<SolvableId> {
        let name = self.lookup_id(name)?;
        self.solvable_ids()
            .filter(|&id| {
                self.solvable(id)
                    .map(|s| s.name == name && repo.map_or(true, |r| s.repo == r))
                    .unwrap_or(false)
            })
            .filter(|&id| self.installable(id))
            .min_by(|&a, &b| self.compare_preference(a, b))
    }

    /// `name-evr.arch`
    pub fn solvable_str(&self, id: SolvableId) -> String {
        match self.solvable(id) {
            Some(s) => format!(
                "{}-{}.{}",
                self.id_str(s.name),
                self.id_str(s.evr),
                self.id_str(s.arch)
            ),
            None => format!("<unknown solvable {}>", id),
        }
    }

    /// `name op evr`
    pub fn relation_str(&self, relation: &Relation) -> String {
        if relation.is_versioned() {
            format!(
                "{} {} {}",
                self.id_str(relation.name),
                relation.op,
                self.id_str(relation.evr)
            )
        } else {
            self.id_str(relation.name).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_repo_and_solvables() {
        let mut pool = Pool::new();
        let repo = pool.create_repo("foo").unwrap();
        let a = pool.add_solvable_with(repo, "A", "1.0", "noarch", &[]).unwrap();
        let b = pool.add_solvable_with(repo, "B", "2.0-1", "x86_64", &[]).unwrap();

        assert_eq!(pool.len(), 2);
        assert_eq!(pool.repo(repo).unwrap().solvables(), &[a, b]);
        assert_eq!(pool.repo(repo).unwrap().name(), "foo");
        assert_eq!(pool.solvable_str(b), "B-2.0-1.x86_64");
    }

    #[test]
    fn test_unknown_repo() {
        let mut pool = Pool::new();
        let err = pool.add_solvable_with(RepoId(3), "A", "1", "noarch", &[]);
        assert!(matches!(err, Err(SolvError::UnknownRepository(3))));
    }

    #[test]
    fn test_frozen_after_prepare() {
        let mut pool = Pool::new();
        let repo = pool.create_repo("foo").unwrap();
        pool.prepare();

        assert!(matches!(pool.create_repo("bar"), Err(SolvError::PoolFrozen)));
        assert!(matches!(
            pool.add_solvable_with(repo, "A", "1", "noarch", &[]),
            Err(SolvError::PoolFrozen)
        ));
        assert!(matches!(pool.set_arch("x86_64"), Err(SolvError::PoolFrozen)));
    }

    #[test]
    fn test_what_provides_requires_prepare() {
        let mut pool = Pool::new();
        let rel = pool.parse_relation("A").unwrap();
        assert!(matches!(pool.what_provides(&rel), Err(SolvError::NotPrepared)));
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let mut pool = Pool::new();
        let repo = pool.create_repo("foo").unwrap();
        pool.add_solvable_with(repo, "A", "1", "noarch", &[(DepKind::Provides, "virt = 1")])
            .unwrap();
        pool.add_solvable_with(repo, "B", "1", "noarch", &[(DepKind::Provides, "virt")])
            .unwrap();

        pool.prepare();
        let first = pool.whatprovides_index().cloned();
        pool.prepare();
        let second = pool.whatprovides_index().cloned();
        assert_eq!(first, second);

        let rel = pool.parse_relation("virt").unwrap();
        assert_eq!(pool.what_provides(&rel).unwrap().len(), 2);
    }

    #[test]
    fn test_arch_filters_providers() {
        let mut pool = Pool::new();
        pool.set_arch("i686").unwrap();
        let repo = pool.create_repo("foo").unwrap();
        let a64 = pool.add_solvable_with(repo, "A", "1", "x86_64", &[]).unwrap();
        let a32 = pool.add_solvable_with(repo, "A", "1", "i686", &[]).unwrap();
        let src = pool.add_solvable_with(repo, "A", "1", "src", &[]).unwrap();
        pool.prepare();

        assert!(!pool.installable(a64));
        assert!(pool.installable(a32));
        assert!(!pool.installable(src));

        let rel = pool.parse_relation("A").unwrap();
        assert_eq!(pool.what_provides(&rel).unwrap(), vec![a32]);
    }

    #[test]
    fn test_installed_always_considered() {
        let mut pool = Pool::new();
        pool.set_arch("i686").unwrap();
        let system = pool.create_repo("system").unwrap();
        let a = pool.add_solvable_with(system, "A", "1", "x86_64", &[]).unwrap();
        pool.set_installed(system).unwrap();
        pool.prepare();

        let rel = pool.parse_relation("A").unwrap();
        assert_eq!(pool.what_provides(&rel).unwrap(), vec![a]);
        assert!(pool.is_installed(a));
    }

    #[test]
    fn test_find_prefers_best() {
        let mut pool = Pool::new();
        pool.set_arch("x86_64").unwrap();
        let repo = pool.create_repo("foo").unwrap();
        let other = pool.create_repo("bar").unwrap();
        pool.add_solvable_with(repo, "A", "1.0", "x86_64", &[]).unwrap();
        let best = pool.add_solvable_with(repo, "A", "2.0", "x86_64", &[]).unwrap();
        pool.add_solvable_with(repo, "A", "3.0", "i686", &[]).unwrap();
        let in_bar = pool.add_solvable_with(other, "A", "0.5", "x86_64", &[]).unwrap();
        pool.prepare();

        assert_eq!(pool.find("A", None), Some(best));
        assert_eq!(pool.find("A", Some(other)), Some(in_bar));
        assert_eq!(pool.find("missing", None), None);
    }

    #[test]
    fn test_repo_priority_beats_version() {
        let mut pool = Pool::new();
        let low = pool.create_repo("low").unwrap();
        let high = pool.create_repo("high").unwrap();
        pool.repo_mut(high).unwrap().set_priority(10);
        pool.add_solvable_with(low, "A", "2.0", "noarch", &[]).unwrap();
        let preferred = pool.add_solvable_with(high, "A", "1.0", "noarch", &[]).unwrap();
        pool.prepare();

        assert_eq!(pool.find("A", None), Some(preferred));
    }

    #[test]
    fn test_relation_str() {
        let mut pool = Pool::new();
        let rel = pool.parse_relation("glibc >= 2:2.17").unwrap();
        assert_eq!(pool.relation_str(&rel), "glibc >= 2:2.17");
        let plain = pool.parse_relation("zlib").unwrap();
        assert_eq!(pool.relation_str(&plain), "zlib");
        assert!(pool.parse_relation("bad >=").is_err());
    }

    #[test]
    fn test_apply_config() {
        let mut pool = Pool::new();
        let config = SolverConfig {
            arch: Some("x86_64".to_string()),
            promote_epoch: true,
            ..Default::default()
        };
        pool.apply_config(&config).unwrap();
        assert_eq!(pool.arch(), Some("x86_64"));
        assert!(pool.promote_epoch());

        let bad = SolverConfig {
            arch: Some("pdp11".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Pool::new().apply_config(&bad),
            Err(SolvError::UnknownArchitecture(_))
        ));
    }
}
