use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Instant;

use indexmap::IndexMap;

use super::job::{Job, JobCommand, JobQueue};
use super::policy::Policy;
use super::rule::{literal, Rule};
use super::rule_set::RuleSet;
use crate::config::SolverFlags;
use crate::error::UsageError;
use crate::pool::{Id, Pool, Relation, SolvableId};

/// What a job resolved to against the pool
#[derive(Debug, Clone, PartialEq, Eq)]
enum JobTarget {
    Install(Vec<SolvableId>),
    Erase(Vec<SolvableId>),
    Update(Vec<SolvableId>),
    UpdateAll,
    DistUpgrade(Vec<SolvableId>),
    Lock(SolvableId),
}

/// Output of rule generation
#[derive(Debug, Clone)]
pub struct GeneratedRules {
    pub rules: RuleSet,
    /// Solvables rules were generated for, in id order
    pub universe: Vec<SolvableId>,
    /// Solvables of the installed repository, in id order
    pub installed: Vec<SolvableId>,
    /// Installed solvable -> its update rule
    pub update_rules: IndexMap<SolvableId, u32>,
    /// Installed solvables that should move to their best candidate
    pub update_targets: BTreeSet<SolvableId>,
    /// Job index -> rules generated for it
    pub job_rules: IndexMap<usize, Vec<u32>>,
    /// Update rule disabled for jobs -> those jobs. Dropping all of them
    /// enables the rule again.
    pub update_blockers: IndexMap<u32, Vec<usize>>,
    /// Installed solvable only needed by what cleandeps erase jobs remove
    /// -> those jobs
    pub clean_deps: IndexMap<SolvableId, Vec<usize>>,
}

/// Generates SAT rules from the pool and a job queue.
///
/// This converts the dependency relationships into SAT clauses:
/// - Package rules for every solvable reachable from the installed
///   system, the jobs and the update candidates
/// - Update rules: an installed solvable stays or is replaced by an update
/// - Job rules: one or more rules per job
///
/// Rules are added in that order, so rule ids of package rules are lower
/// than those of update rules, which are lower than those of job rules.
pub struct RuleGenerator<'a> {
    pool: &'a Pool,
    flags: SolverFlags,
    policy: Policy,
    rules: RuleSet,
    universe: BTreeSet<SolvableId>,
    queue: VecDeque<SolvableId>,
}

impl<'a> RuleGenerator<'a> {
    pub fn new(pool: &'a Pool, flags: SolverFlags) -> Self {
        Self {
            pool,
            flags,
            policy: Policy::new(flags),
            rules: RuleSet::new(),
            universe: BTreeSet::new(),
            queue: VecDeque::new(),
        }
    }

    /// Generate all rules for a job queue
    pub fn generate(mut self, jobs: &JobQueue) -> Result<GeneratedRules, UsageError> {
        let start = Instant::now();
        let pool = self.pool;

        let targets = jobs
            .iter()
            .enumerate()
            .map(|(index, job)| self.resolve_job(index, job))
            .collect::<Result<Vec<_>, _>>()?;

        let installed = self.installed_ids();

        let mut update_targets = BTreeSet::new();
        // Installed solvable -> jobs its update rule must give way to
        let mut blockers: BTreeMap<SolvableId, BTreeSet<usize>> = BTreeMap::new();
        let mut dup_choices: BTreeMap<SolvableId, Vec<SolvableId>> = BTreeMap::new();
        let mut orphans = BTreeSet::new();
        for (index, target) in targets.iter().enumerate() {
            match target {
                JobTarget::Update(ids) => update_targets.extend(ids.iter().copied()),
                JobTarget::UpdateAll => update_targets.extend(installed.iter().copied()),
                JobTarget::Erase(ids) => {
                    for &id in ids.iter().filter(|&&id| pool.is_installed(id)) {
                        blockers.entry(id).or_default().insert(index);
                    }
                }
                JobTarget::DistUpgrade(ids) => {
                    for &id in ids {
                        let choices = self.dup_choices(id);
                        if choices.is_empty() {
                            orphans.insert(id);
                            continue;
                        }
                        blockers.entry(id).or_default().insert(index);
                        dup_choices.insert(id, choices);
                    }
                }
                _ => {}
            }
        }
        if self.flags.update_system {
            update_targets.extend(installed.iter().copied());
        }

        // Universe: installed system, update candidates and job candidates
        let update_candidates: IndexMap<SolvableId, Vec<SolvableId>> = installed
            .iter()
            .map(|&id| (id, self.policy.find_update_candidates(pool, id)))
            .collect();

        for &id in &installed {
            self.add_to_universe(id);
        }
        for candidates in update_candidates.values().chain(dup_choices.values()) {
            for &id in candidates {
                self.add_to_universe(id);
            }
        }
        for target in &targets {
            match target {
                JobTarget::Install(ids) => {
                    for &id in ids {
                        self.add_to_universe(id);
                    }
                }
                JobTarget::Lock(id) => self.add_to_universe(*id),
                _ => {}
            }
        }
        self.process_queue();
        if !self.flags.ignore_recommended {
            self.add_supplementing();
        }
        log::debug!("Rule generation universe: {} solvables", self.universe.len());

        // Package rules
        let universe: Vec<SolvableId> = self.universe.iter().copied().collect();
        for &id in &universe {
            self.add_package_rules(id);
        }
        self.add_same_name_rules(&universe);
        log::debug!("After package rules: {} rules", self.rules.len());

        // Update rules
        for (id, owners) in self.obsoleted_by_install_jobs(&targets, &installed) {
            blockers.entry(id).or_default().extend(owners);
        }
        let clean_deps = self.clean_deps_candidates(jobs, &targets);
        for (&id, owners) in &clean_deps {
            blockers.entry(id).or_default().extend(owners.iter().copied());
        }
        if !orphans.is_empty() {
            log::debug!("{} installed solvable(s) not available for distupgrade", orphans.len());
        }

        let mut update_rules = IndexMap::new();
        let mut update_blockers = IndexMap::new();
        for (&id, candidates) in &update_candidates {
            // Orphans may go if they are in the way of a distupgrade
            let weak = self.flags.allow_uninstall || orphans.contains(&id);
            let rule_id = self.rules.add(Rule::update(id, candidates).with_weak(weak));
            if let Some(owners) = blockers.get(&id) {
                self.rules.disable(rule_id);
                update_blockers.insert(rule_id, owners.iter().copied().collect::<Vec<usize>>());
            }
            update_rules.insert(id, rule_id);
        }
        log::debug!("After update rules: {} rules", self.rules.len());

        // Job rules
        let mut job_rules = IndexMap::new();
        for (index, (job, target)) in jobs.iter().zip(&targets).enumerate() {
            let ids = self.add_job_rules(index, job, target, &dup_choices);
            job_rules.insert(index, ids);
        }
        log::debug!("After job rules: {} rules", self.rules.len());

        let stats = self.rules.stats();
        log::debug!("Rules by type: {:?}", stats);
        log::info!(
            "Rule generation: {} rules for {} solvables ({} requires, {} conflicts, {} update, {} job) in {:?}",
            stats.total,
            universe.len(),
            stats.requires,
            stats.conflict,
            stats.update,
            stats.job,
            start.elapsed()
        );

        Ok(GeneratedRules {
            rules: self.rules,
            universe,
            installed,
            update_rules,
            update_targets,
            job_rules,
            update_blockers,
            clean_deps,
        })
    }

    /// Solvables of the installed repository, in id order
    fn installed_ids(&self) -> Vec<SolvableId> {
        let pool = self.pool;
        pool.installed()
            .and_then(|repo| pool.repo(repo))
            .map(|repo| {
                let mut ids = repo.solvables().to_vec();
                ids.sort_unstable();
                ids
            })
            .unwrap_or_default()
    }

    fn check_solvable(&self, index: usize, id: SolvableId) -> Result<(), UsageError> {
        if self.pool.solvable(id).is_none() {
            return Err(UsageError::InvalidJob {
                index,
                reason: format!("unknown solvable {}", id),
            });
        }
        Ok(())
    }

    fn check_id(&self, index: usize, id: Id) -> Result<(), UsageError> {
        if !self.pool.is_known_id(id) {
            return Err(UsageError::InvalidJob {
                index,
                reason: format!("unknown name {}", id),
            });
        }
        Ok(())
    }

    fn check_relation(&self, index: usize, relation: &Relation) -> Result<(), UsageError> {
        self.check_id(index, relation.name)?;
        self.check_id(index, relation.evr)
    }

    fn installed_named(&self, name: Id) -> Vec<SolvableId> {
        self.pool
            .same_name(name)
            .into_iter()
            .filter(|&id| self.pool.is_installed(id))
            .collect()
    }

    /// Validate a job and find the solvables it selects
    fn resolve_job(&self, index: usize, job: &Job) -> Result<JobTarget, UsageError> {
        let pool = self.pool;
        let target = match &job.command {
            JobCommand::InstallSolvable(id) => {
                self.check_solvable(index, *id)?;
                JobTarget::Install(vec![*id])
            }
            JobCommand::InstallName(name) => {
                self.check_id(index, *name)?;
                JobTarget::Install(pool.same_name(*name))
            }
            JobCommand::InstallRelation(rel) => {
                self.check_relation(index, rel)?;
                JobTarget::Install(pool.providers(rel))
            }
            JobCommand::InstallOneOf(ids) => {
                if ids.is_empty() {
                    return Err(UsageError::InvalidJob {
                        index,
                        reason: "empty candidate list".to_string(),
                    });
                }
                for &id in ids {
                    self.check_solvable(index, id)?;
                }
                let mut ids = ids.clone();
                ids.dedup();
                JobTarget::Install(ids)
            }
            JobCommand::EraseSolvable(id) => {
                self.check_solvable(index, *id)?;
                JobTarget::Erase(vec![*id])
            }
            JobCommand::EraseName(name) => {
                self.check_id(index, *name)?;
                JobTarget::Erase(pool.same_name(*name))
            }
            JobCommand::EraseRelation(rel) => {
                self.check_relation(index, rel)?;
                JobTarget::Erase(pool.providers(rel))
            }
            JobCommand::UpdateSolvable(id) => {
                self.check_solvable(index, *id)?;
                if pool.is_installed(*id) {
                    JobTarget::Update(vec![*id])
                } else {
                    log::warn!(
                        "Ignoring update job #{}: {} is not installed",
                        index,
                        pool.solvable_str(*id)
                    );
                    JobTarget::Update(Vec::new())
                }
            }
            JobCommand::UpdateName(name) => {
                self.check_id(index, *name)?;
                let ids = self.installed_named(*name);
                if ids.is_empty() {
                    log::warn!(
                        "Ignoring update job #{}: {} is not installed",
                        index,
                        pool.id_str(*name)
                    );
                }
                JobTarget::Update(ids)
            }
            JobCommand::UpdateSystem => JobTarget::UpdateAll,
            JobCommand::DistUpgradeName(name) => {
                self.check_id(index, *name)?;
                let ids = self.installed_named(*name);
                if ids.is_empty() {
                    JobTarget::Install(pool.same_name(*name))
                } else {
                    JobTarget::DistUpgrade(ids)
                }
            }
            JobCommand::DistUpgradeSystem => JobTarget::DistUpgrade(self.installed_ids()),
            JobCommand::Lock(id) => {
                self.check_solvable(index, *id)?;
                JobTarget::Lock(*id)
            }
        };
        Ok(target)
    }

    fn add_to_universe(&mut self, id: SolvableId) {
        if self.universe.insert(id) {
            self.queue.push_back(id);
        }
    }

    /// Breadth-first walk over requires (and recommends) providers
    fn process_queue(&mut self) {
        let pool = self.pool;
        while let Some(id) = self.queue.pop_front() {
            if !pool.considered(id) {
                continue;
            }
            let Some(solvable) = pool.solvable(id) else {
                continue;
            };

            for rel in &solvable.deps.requires {
                for provider in pool.providers(rel) {
                    self.add_to_universe(provider);
                }
            }
            if !self.flags.ignore_recommended {
                for rel in &solvable.deps.recommends {
                    for provider in pool.providers(rel) {
                        self.add_to_universe(provider);
                    }
                }
            }
        }
    }

    /// Pull in solvables that supplement (or freshen) something already
    /// in the universe, until nothing changes
    fn add_supplementing(&mut self) {
        let pool = self.pool;
        loop {
            let mut added = false;
            for id in pool.solvable_ids() {
                if self.universe.contains(&id) || !pool.installable(id) {
                    continue;
                }
                let Some(solvable) = pool.solvable(id) else {
                    continue;
                };
                let hit = solvable
                    .deps
                    .supplements
                    .iter()
                    .chain(&solvable.deps.freshens)
                    .any(|rel| pool.providers(rel).iter().any(|p| self.universe.contains(p)));
                if hit {
                    self.add_to_universe(id);
                    self.process_queue();
                    added = true;
                }
            }
            if !added {
                break;
            }
        }
    }

    /// Requires, conflicts, obsoletes and installability of one solvable
    fn add_package_rules(&mut self, id: SolvableId) {
        let pool = self.pool;
        let Some(solvable) = pool.solvable(id) else {
            return;
        };
        let installed = pool.is_installed(id);
        // Broken installed packages are not repaired unless fix_system
        let dontfix = installed && !self.flags.fix_system;

        if !dontfix && !pool.installable(id) {
            self.rules.add(Rule::not_installable(id));
            return;
        }

        for rel in &solvable.deps.requires {
            let providers = pool.providers(rel);
            if providers.contains(&id) {
                continue;
            }
            if dontfix && !providers.iter().any(|&p| pool.is_installed(p)) {
                log::warn!(
                    "Installed {} has an unmet requirement {}, leaving it broken",
                    pool.solvable_str(id),
                    pool.relation_str(rel)
                );
                continue;
            }
            if providers.is_empty() {
                self.rules.add(Rule::nothing_provides(id, *rel));
            } else {
                self.rules.add(Rule::requires(id, &providers, *rel));
            }
        }

        for rel in &solvable.deps.conflicts {
            for provider in pool.providers(rel) {
                if provider == id || !self.universe.contains(&provider) {
                    continue;
                }
                if dontfix && pool.is_installed(provider) {
                    continue;
                }
                self.rules.add(Rule::conflict(id, provider, *rel));
            }
        }

        let Some(index) = pool.whatprovides_index() else {
            return;
        };
        for rel in &solvable.deps.obsoletes {
            for &target in index.get(rel.name) {
                if target == id || !self.universe.contains(&target) || !pool.considered(target) {
                    continue;
                }
                // Same-name pairs get their own rule
                if pool.solvable(target).map(|t| t.name) == Some(solvable.name) {
                    continue;
                }
                if !pool.matches_name_evr(target, rel) {
                    continue;
                }
                if installed {
                    if !pool.is_installed(target) {
                        self.rules.add(Rule::installed_obsoletes(id, target, *rel));
                    }
                } else {
                    self.rules.add(Rule::obsoletes(id, target, *rel));
                }
            }
        }
    }

    /// At most one solvable per name
    fn add_same_name_rules(&mut self, universe: &[SolvableId]) {
        let pool = self.pool;
        let mut by_name: BTreeMap<Id, Vec<SolvableId>> = BTreeMap::new();
        for &id in universe {
            if let Some(solvable) = pool.solvable(id) {
                by_name.entry(solvable.name).or_default().push(id);
            }
        }

        for ids in by_name.values() {
            for (i, &a) in ids.iter().enumerate() {
                for &b in &ids[i + 1..] {
                    if !self.flags.fix_system && pool.is_installed(a) && pool.is_installed(b) {
                        continue;
                    }
                    self.rules.add(Rule::same_name(a, b));
                }
            }
        }
    }

    /// Installed solvables obsoleted by the candidates of an install job
    /// that has no installed candidate, with those jobs. Their update rules
    /// are disabled so the install can replace them.
    fn obsoleted_by_install_jobs(
        &self,
        targets: &[JobTarget],
        installed: &[SolvableId],
    ) -> BTreeMap<SolvableId, BTreeSet<usize>> {
        let pool = self.pool;
        let mut result: BTreeMap<SolvableId, BTreeSet<usize>> = BTreeMap::new();

        for (index, target) in targets.iter().enumerate() {
            let JobTarget::Install(candidates) = target else {
                continue;
            };
            if candidates.iter().any(|&c| pool.is_installed(c)) {
                continue;
            }
            for &candidate in candidates {
                let Some(solvable) = pool.solvable(candidate) else {
                    continue;
                };
                for &old in installed {
                    if solvable.deps.obsoletes.iter().any(|rel| pool.matches_name_evr(old, rel)) {
                        result.entry(old).or_default().insert(index);
                    }
                }
            }
        }

        result
    }

    /// What a distupgrade may leave in place of an installed solvable:
    /// every available solvable of the same name, and the installed one
    /// itself when an identical copy is available. Empty for orphans.
    fn dup_choices(&self, id: SolvableId) -> Vec<SolvableId> {
        let pool = self.pool;
        let Some(current) = pool.solvable(id) else {
            return Vec::new();
        };

        let mut keep = false;
        let mut choices = Vec::new();
        for other in pool.same_name(current.name) {
            if pool.is_installed(other) || !pool.installable(other) {
                continue;
            }
            let Some(solvable) = pool.solvable(other) else {
                continue;
            };
            if solvable.evr == current.evr && solvable.arch == current.arch {
                keep = true;
            } else {
                choices.push(other);
            }
        }
        if keep {
            choices.insert(0, id);
        }
        choices
    }

    /// Installed solvables reachable through requires (and recommends)
    /// from what cleandeps erase jobs remove, with those jobs
    fn clean_deps_candidates(&self, jobs: &JobQueue, targets: &[JobTarget]) -> IndexMap<SolvableId, Vec<usize>> {
        let pool = self.pool;
        let mut result: BTreeMap<SolvableId, Vec<usize>> = BTreeMap::new();

        for (index, (job, target)) in jobs.iter().zip(targets).enumerate() {
            let JobTarget::Erase(victims) = target else {
                continue;
            };
            if !job.clean_deps {
                continue;
            }
            let victims: BTreeSet<SolvableId> = victims.iter().copied().filter(|&v| pool.is_installed(v)).collect();

            let mut seen = BTreeSet::new();
            let mut queue: VecDeque<SolvableId> = victims.iter().copied().collect();
            while let Some(id) = queue.pop_front() {
                let Some(solvable) = pool.solvable(id) else {
                    continue;
                };
                let recommends: &[Relation] = if self.flags.ignore_recommended {
                    &[]
                } else {
                    &solvable.deps.recommends
                };
                for rel in solvable.deps.requires.iter().chain(recommends) {
                    for provider in pool.providers(rel) {
                        if pool.is_installed(provider) && !victims.contains(&provider) && seen.insert(provider) {
                            queue.push_back(provider);
                        }
                    }
                }
            }

            log::debug!("Job #{} may clean up {} dependencies", index, seen.len());
            for id in seen {
                result.entry(id).or_default().push(index);
            }
        }

        result.into_iter().collect()
    }

    fn add_job_rules(
        &mut self,
        index: usize,
        job: &Job,
        target: &JobTarget,
        dup_choices: &BTreeMap<SolvableId, Vec<SolvableId>>,
    ) -> Vec<u32> {
        let pool = self.pool;
        let mut ids = Vec::new();

        match target {
            JobTarget::Install(candidates) => {
                if candidates.is_empty() {
                    log::debug!("Job #{} ({}) matches nothing", index, job.describe(pool));
                }
                let literals = candidates.iter().map(|&c| literal(c, true)).collect();
                ids.push(self.rules.add(Rule::job(literals, index).with_weak(job.weak)));
            }
            JobTarget::Erase(victims) => {
                if victims.is_empty() {
                    log::debug!("Job #{} ({}) matches nothing to erase", index, job.describe(pool));
                }
                for &victim in victims {
                    let rule = Rule::job(vec![literal(victim, false)], index).with_weak(job.weak);
                    ids.push(self.rules.add(rule));
                }
            }
            JobTarget::Lock(id) => {
                let keep = pool.is_installed(*id);
                let rule = Rule::job(vec![literal(*id, keep)], index).with_weak(job.weak);
                ids.push(self.rules.add(rule));
            }
            JobTarget::DistUpgrade(installed) => {
                for id in installed {
                    // Orphans have no choices and stay under their update rule
                    let Some(choices) = dup_choices.get(id) else {
                        continue;
                    };
                    let literals = choices.iter().map(|&c| literal(c, true)).collect();
                    ids.push(self.rules.add(Rule::job(literals, index).with_weak(job.weak)));
                }
            }
            JobTarget::Update(_) | JobTarget::UpdateAll => {}
        }

        ids
    }
}
