use std::cmp::Ordering;

use satsolv_evr::{compare_evr, EvrCmp};

use crate::config::SolverFlags;
use crate::pool::{Pool, SolvableId};

/// Policy for selecting between candidate solvables.
///
/// When multiple solvables can satisfy a job or a requirement, the policy
/// determines which one to try first. Candidates are ranked by:
/// 1. Architecture score (better match with the pool architecture first)
/// 2. Repository priority (higher first)
/// 3. Version (higher first)
/// 4. Already installed
/// 5. Solvable id
#[derive(Debug, Clone, Copy, Default)]
pub struct Policy {
    flags: SolverFlags,
}

impl Policy {
    pub fn new(flags: SolverFlags) -> Self {
        Self { flags }
    }

    /// Compare two candidates, `Less` means `a` is preferred
    pub fn compare(&self, pool: &Pool, a: SolvableId, b: SolvableId) -> Ordering {
        pool.compare_rank(a, b)
            .then_with(|| pool.is_installed(b).cmp(&pool.is_installed(a)))
            .then_with(|| a.cmp(&b))
    }

    /// Candidates sorted by preference (best first)
    pub fn select_preferred(&self, pool: &Pool, candidates: &[SolvableId]) -> Vec<SolvableId> {
        let mut sorted = candidates.to_vec();
        sorted.sort_by(|&a, &b| self.compare(pool, a, b));
        sorted.dedup();
        sorted
    }

    /// Like `select_preferred`, but installed candidates come first.
    /// Used when fulfilling requirements so working systems stay untouched.
    pub fn select_preferred_installed(&self, pool: &Pool, candidates: &[SolvableId]) -> Vec<SolvableId> {
        let mut sorted = self.select_preferred(pool, candidates);
        sorted.sort_by_key(|&id| !pool.is_installed(id));
        sorted
    }

    pub fn select_best(&self, pool: &Pool, candidates: &[SolvableId]) -> Option<SolvableId> {
        candidates
            .iter()
            .copied()
            .min_by(|&a, &b| self.compare(pool, a, b))
    }

    /// Solvables that may replace an installed solvable.
    ///
    /// Same-name solvables with a version not lower than the installed one
    /// (any version with `allow_downgrade`), plus solvables obsoleting it
    /// unless `no_update_provide` is set. Candidates from the installed
    /// repository and candidates changing to an incompatible architecture
    /// are skipped unless `allow_arch_change` is set.
    pub fn find_update_candidates(&self, pool: &Pool, installed: SolvableId) -> Vec<SolvableId> {
        let Some(index) = pool.whatprovides_index() else {
            return Vec::new();
        };
        let Some(current) = pool.solvable(installed) else {
            return Vec::new();
        };
        let current_evr = pool.id_str(current.evr);
        let current_arch = pool.id_str(current.arch);

        let mut candidates = Vec::new();
        for &candidate in index.get(current.name) {
            if candidate == installed || pool.is_installed(candidate) || !pool.installable(candidate) {
                continue;
            }
            let Some(solvable) = pool.solvable(candidate) else {
                continue;
            };

            if solvable.name == current.name {
                if !self.flags.allow_downgrade
                    && compare_evr(current_evr, pool.id_str(solvable.evr), EvrCmp::Compare)
                        == Ordering::Greater
                {
                    continue;
                }
            } else {
                if self.flags.no_update_provide {
                    continue;
                }
                let obsoletes = solvable
                    .deps
                    .obsoletes
                    .iter()
                    .any(|rel| pool.matches_name_evr(installed, rel));
                if !obsoletes {
                    continue;
                }
            }

            if !self.flags.allow_arch_change
                && pool
                    .arch_policy()
                    .is_illegal_change(current_arch, pool.id_str(solvable.arch))
            {
                continue;
            }

            candidates.push(candidate);
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DepKind;

    #[test]
    fn test_select_newest() {
        let mut pool = Pool::new();
        let repo = pool.create_repo("repo").unwrap();
        let old = pool.add_solvable_with(repo, "A", "1.0", "noarch", &[]).unwrap();
        let new = pool.add_solvable_with(repo, "A", "2.0", "noarch", &[]).unwrap();
        pool.prepare();

        let policy = Policy::default();
        assert_eq!(policy.select_preferred(&pool, &[old, new]), vec![new, old]);
        assert_eq!(policy.select_best(&pool, &[old, new]), Some(new));
        assert_eq!(policy.select_best(&pool, &[]), None);
    }

    #[test]
    fn test_installed_wins_tie() {
        let mut pool = Pool::new();
        let system = pool.create_repo("system").unwrap();
        let repo = pool.create_repo("repo").unwrap();
        let available = pool.add_solvable_with(repo, "A", "1.0", "noarch", &[]).unwrap();
        let installed = pool.add_solvable_with(system, "A", "1.0", "noarch", &[]).unwrap();
        pool.set_installed(system).unwrap();
        pool.prepare();

        let policy = Policy::default();
        assert_eq!(policy.select_best(&pool, &[available, installed]), Some(installed));
    }

    #[test]
    fn test_installed_first_for_requirements() {
        let mut pool = Pool::new();
        let system = pool.create_repo("system").unwrap();
        let repo = pool.create_repo("repo").unwrap();
        let installed = pool.add_solvable_with(system, "A", "1.0", "noarch", &[]).unwrap();
        let newer = pool.add_solvable_with(repo, "A", "2.0", "noarch", &[]).unwrap();
        pool.set_installed(system).unwrap();
        pool.prepare();

        let policy = Policy::default();
        assert_eq!(
            policy.select_preferred_installed(&pool, &[newer, installed]),
            vec![installed, newer]
        );
    }

    #[test]
    fn test_update_candidates() {
        let mut pool = Pool::new();
        let system = pool.create_repo("system").unwrap();
        let repo = pool.create_repo("repo").unwrap();
        let installed = pool.add_solvable_with(system, "A", "2.0", "noarch", &[]).unwrap();
        let older = pool.add_solvable_with(repo, "A", "1.0", "noarch", &[]).unwrap();
        let same = pool.add_solvable_with(repo, "A", "2.0", "noarch", &[]).unwrap();
        let newer = pool.add_solvable_with(repo, "A", "3.0", "noarch", &[]).unwrap();
        let replacement = pool
            .add_solvable_with(
                repo,
                "B",
                "1.0",
                "noarch",
                &[(DepKind::Provides, "A = 4.0"), (DepKind::Obsoletes, "A < 3")],
            )
            .unwrap();
        let provider_only = pool
            .add_solvable_with(repo, "C", "1.0", "noarch", &[(DepKind::Provides, "A")])
            .unwrap();
        pool.set_installed(system).unwrap();
        pool.prepare();

        let candidates = Policy::default().find_update_candidates(&pool, installed);
        assert_eq!(candidates, vec![same, newer, replacement]);
        assert!(!candidates.contains(&older));
        assert!(!candidates.contains(&provider_only));

        let downgrade = Policy::new(SolverFlags::default().allow_downgrade(true))
            .find_update_candidates(&pool, installed);
        assert!(downgrade.contains(&older));

        let no_provide = Policy::new(SolverFlags::default().no_update_provide(true))
            .find_update_candidates(&pool, installed);
        assert_eq!(no_provide, vec![same, newer]);
    }

    #[test]
    fn test_update_candidates_arch_change() {
        let mut pool = Pool::new();
        pool.set_arch("x86_64").unwrap();
        let system = pool.create_repo("system").unwrap();
        let repo = pool.create_repo("repo").unwrap();
        let installed = pool.add_solvable_with(system, "A", "1.0", "x86_64", &[]).unwrap();
        let same_arch = pool.add_solvable_with(repo, "A", "2.0", "x86_64", &[]).unwrap();
        let other_arch = pool.add_solvable_with(repo, "A", "2.0", "i686", &[]).unwrap();
        let noarch = pool.add_solvable_with(repo, "A", "3.0", "noarch", &[]).unwrap();
        pool.set_installed(system).unwrap();
        pool.prepare();

        let candidates = Policy::default().find_update_candidates(&pool, installed);
        assert_eq!(candidates, vec![same_arch, noarch]);

        let relaxed = Policy::new(SolverFlags::default().allow_arch_change(true))
            .find_update_candidates(&pool, installed);
        assert_eq!(relaxed, vec![same_arch, other_arch, noarch]);
    }
}
