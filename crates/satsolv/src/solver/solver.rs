use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use indexmap::IndexMap;

use super::decisions::Decisions;
use super::job::JobQueue;
use super::policy::Policy;
use super::problem::{Problem, ProblemSet};
use super::rule::{literal, literal_solvable, Literal, Rule, RuleType};
use super::rule_generator::{GeneratedRules, RuleGenerator};
use super::rule_set::{RuleSet, RuleSetStats};
use super::transaction::{Decision, DecisionReason, Transaction};
use super::watch_graph::{PropagateResult, Propagator, WatchGraph};
use crate::config::{SolverConfig, SolverFlags};
use crate::error::{SolveError, UsageError};
use crate::pool::{Pool, SolvableId};

/// The main SAT solver for dependency resolution.
///
/// Implements a CDCL (Conflict-Driven Clause Learning) algorithm
/// adapted for package dependency resolution. A solver borrows the pool
/// immutably, so any number of solvers may share one prepared pool.
pub struct Solver<'a> {
    pool: &'a Pool,
    flags: SolverFlags,
    max_steps: Option<u64>,
    timeout: Option<Duration>,
    outcome: Option<Outcome>,
}

/// A decision point that had more than one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub level: u32,
    pub chosen: SolvableId,
    /// Remaining candidates, best first
    pub alternatives: Vec<SolvableId>,
    pub reason: DecisionReason,
}

/// Statistics of the last solve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub rules: RuleSetStats,
    pub decisions: usize,
    pub learned_rules: usize,
    pub conflicts: usize,
    pub restarts: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
struct Outcome {
    transaction: Transaction,
    problems: ProblemSet,
    recommendations: Vec<SolvableId>,
    suggestions: Vec<SolvableId>,
    ignored_jobs: Vec<usize>,
    alternatives: Vec<Alternative>,
    stats: SolverStats,
}

impl<'a> Solver<'a> {
    pub fn new(pool: &'a Pool) -> Self {
        Self {
            pool,
            flags: SolverFlags::default(),
            max_steps: None,
            timeout: None,
            outcome: None,
        }
    }

    pub fn with_flags(mut self, flags: SolverFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Take flags and search budget from a configuration
    pub fn with_config(mut self, config: &SolverConfig) -> Self {
        self.flags = config.flags;
        self.max_steps = config.max_steps;
        self.timeout = config.timeout();
        self
    }

    /// Limit the number of decisions plus conflicts
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn flags(&self) -> SolverFlags {
        self.flags
    }

    pub fn pool(&self) -> &'a Pool {
        self.pool
    }

    /// Solve a job queue.
    ///
    /// Returns the transaction on success. Caller mistakes are reported as
    /// `SolveError::Usage` before any search; unsatisfiable requests and
    /// exhausted budgets as `SolveError::Unsolvable`.
    pub fn solve(&mut self, jobs: &JobQueue) -> Result<Transaction, SolveError> {
        self.outcome = None;

        if !self.pool.is_prepared() {
            return Err(UsageError::NotPrepared.into());
        }
        if jobs.is_empty() {
            return Err(UsageError::EmptyJobQueue.into());
        }

        let start = Instant::now();
        let generated = RuleGenerator::new(self.pool, self.flags).generate(jobs)?;
        let (rules, ctx) = SearchContext::new(self.pool, self.flags, generated);

        let mut state = SolverState::new(rules, self.pool.len());
        let mut budget = Budget::new(self.max_steps, self.timeout);
        let mut stats = SolverStats::default();
        let mut problems = ProblemSet::new();
        let mut ignored_jobs = BTreeSet::new();

        loop {
            match self.run_sat(&mut state, &ctx, &mut budget, &mut stats) {
                SatResult::Solved => break,
                SatResult::Aborted => {
                    log::warn!("Search aborted after {} steps", budget.steps);
                    problems.add(Problem::aborted());
                    break;
                }
                SatResult::Internal(message) => {
                    log::error!("{}", message);
                    return Err(SolveError::Internal(message));
                }
                SatResult::Unsolvable(rule_id) => {
                    let involved = self.analyze_unsolvable(&state, rule_id);
                    if !self.relax(&mut state, &ctx, &involved, &mut problems, &mut ignored_jobs) {
                        break;
                    }
                    stats.restarts += 1;
                    log::debug!("Restarting search ({} restarts)", stats.restarts);
                    state.restart();
                }
            }
        }

        stats.rules = state.rules.stats();
        stats.decisions = state.decisions.len();
        stats.elapsed = start.elapsed();
        log::info!(
            "Solver finished: {} decisions, {} learned rules, {} conflicts, {} restarts in {:.3}s",
            stats.decisions,
            stats.learned_rules,
            stats.conflicts,
            stats.restarts,
            stats.elapsed.as_secs_f64()
        );

        let ignored_jobs: Vec<usize> = ignored_jobs.into_iter().collect();

        if !problems.is_empty() {
            log::debug!("{} problem(s) found", problems.len());
            self.outcome = Some(Outcome {
                problems: problems.clone(),
                ignored_jobs,
                stats,
                ..Default::default()
            });
            return Err(SolveError::Unsolvable(problems));
        }

        let result: BTreeSet<SolvableId> = state.decisions.installed().collect();
        let transaction = Transaction::build(self.pool, &ctx.installed, &result, |id| {
            self.reason_for(&state, id)
        });
        let (recommendations, suggestions) = self.collect_hints(&result);
        let alternatives = state
            .branches
            .iter()
            .filter(|b| b.literal > 0 && !b.alternatives.is_empty())
            .map(|b| Alternative {
                level: b.level,
                chosen: literal_solvable(b.literal),
                alternatives: b.alternatives.clone(),
                reason: b.reason,
            })
            .collect();

        self.outcome = Some(Outcome {
            transaction: transaction.clone(),
            problems: ProblemSet::new(),
            recommendations,
            suggestions,
            ignored_jobs,
            alternatives,
            stats,
        });

        Ok(transaction)
    }

    /// Decisions of the last successful solve
    pub fn decisions(&self) -> &[Decision] {
        self.outcome
            .as_ref()
            .map(|o| o.transaction.decisions())
            .unwrap_or(&[])
    }

    pub fn transaction(&self) -> Option<&Transaction> {
        self.outcome.as_ref().map(|o| &o.transaction)
    }

    /// Problems of the last failed solve
    pub fn problems(&self) -> &[Problem] {
        self.outcome
            .as_ref()
            .map(|o| o.problems.problems())
            .unwrap_or(&[])
    }

    /// Uninstalled solvables recommended by the resulting system
    pub fn recommendations(&self) -> &[SolvableId] {
        self.outcome
            .as_ref()
            .map(|o| o.recommendations.as_slice())
            .unwrap_or(&[])
    }

    /// Uninstalled solvables suggested by, or enhancing, the resulting system
    pub fn suggestions(&self) -> &[SolvableId] {
        self.outcome
            .as_ref()
            .map(|o| o.suggestions.as_slice())
            .unwrap_or(&[])
    }

    /// Indices of weak jobs dropped to reach a solution
    pub fn ignored_jobs(&self) -> &[usize] {
        self.outcome
            .as_ref()
            .map(|o| o.ignored_jobs.as_slice())
            .unwrap_or(&[])
    }

    /// Decision points that had untried candidates
    pub fn alternatives(&self) -> &[Alternative] {
        self.outcome
            .as_ref()
            .map(|o| o.alternatives.as_slice())
            .unwrap_or(&[])
    }

    pub fn stats(&self) -> SolverStats {
        self.outcome.as_ref().map(|o| o.stats).unwrap_or_default()
    }

    /// Main SAT solving loop
    fn run_sat(
        &self,
        state: &mut SolverState,
        ctx: &SearchContext,
        budget: &mut Budget,
        stats: &mut SolverStats,
    ) -> SatResult {
        state.decisions.increment_level(); // Level 1 for assertions
        if let Err(rule_id) = self.process_assertions(state) {
            return SatResult::Unsolvable(rule_id);
        }

        loop {
            if let Err(conflict_rule) = self.propagate(state) {
                stats.conflicts += 1;
                if state.decisions.level() <= 1 {
                    return SatResult::Unsolvable(conflict_rule);
                }
                if budget.exhausted() {
                    return SatResult::Aborted;
                }

                let (learned, backjump, why) = match self.analyze_conflict(state, conflict_rule) {
                    Ok(analysis) => analysis,
                    Err(message) => return SatResult::Internal(message),
                };
                state.decisions.revert_to_level(backjump);
                state.propagate_index = state.decisions.len();
                state.branches.retain(|b| b.level <= backjump);

                let assert = learned[0];
                let learned_id = state.rules.add(Rule::learned(learned, why));
                if let Some(rule) = state.rules.get(learned_id) {
                    log::debug!(
                        "Learned rule {} {:?} from conflict in rule {}, back to level {}",
                        learned_id,
                        rule.literals(),
                        conflict_rule,
                        backjump
                    );
                    state.watch_graph.add_rule(rule);
                }
                stats.learned_rules += 1;
                state.decisions.decide(assert, Some(learned_id));
                continue;
            }

            let Some(choice) = self.select_next(state, ctx) else {
                return SatResult::Solved;
            };
            if budget.exhausted() {
                return SatResult::Aborted;
            }

            state.decisions.increment_level();
            let level = state.decisions.level();
            state.decisions.decide(choice.literal, None);
            state.branches.push(Branch {
                level,
                literal: choice.literal,
                alternatives: choice.alternatives,
                reason: choice.reason,
            });
        }
    }

    /// Decide every enabled single-literal rule at level 1.
    /// Empty rules and contradicting assertions are returned as conflicts.
    fn process_assertions(&self, state: &mut SolverState) -> Result<(), u32> {
        let assertions: Vec<(u32, Option<Literal>)> = state
            .rules
            .iter()
            .filter(|r| !r.is_disabled() && r.literals().len() <= 1)
            .map(|r| (r.id(), r.literals().first().copied()))
            .collect();

        for (rule_id, lit) in assertions {
            let Some(lit) = lit else {
                return Err(rule_id);
            };
            if !state.decisions.decide(lit, Some(rule_id)) {
                return Err(rule_id);
            }
        }

        Ok(())
    }

    /// Propagate consequences of current decisions using unit propagation
    fn propagate(&self, state: &mut SolverState) -> Result<(), u32> {
        while state.propagate_index < state.decisions.len() {
            let (literal, _) = state.decisions.queue()[state.propagate_index];
            state.propagate_index += 1;

            let results = {
                let decisions = &state.decisions;
                let mut propagator = Propagator::new(&mut state.watch_graph, &state.rules);
                propagator.propagate(literal, |lit| decisions.value_of(lit))
            };

            for result in results {
                match result {
                    PropagateResult::Unit(unit, rule_id) => {
                        if !state.decisions.decide(unit, Some(rule_id)) {
                            return Err(rule_id);
                        }
                    }
                    PropagateResult::Conflict(rule_id) => return Err(rule_id),
                }
            }
        }

        Ok(())
    }

    /// Pick the next free decision
    fn select_next(&self, state: &SolverState, ctx: &SearchContext) -> Option<Choice> {
        let pool = self.pool;
        let decisions = &state.decisions;

        // Jobs
        for (&job, rule_ids) in &ctx.job_rules {
            for &rule_id in rule_ids {
                let Some(rule) = state.rules.get(rule_id) else {
                    continue;
                };
                if rule.is_disabled() || rule.literals().len() < 2 {
                    continue;
                }
                if let Some(choice) = self.choose(state, ctx, rule.literals(), false, DecisionReason::Job(job)) {
                    return Some(choice);
                }
            }
        }

        // Installed packages: update targets first, then keep the rest
        for targeted in [true, false] {
            for &id in &ctx.installed {
                if ctx.update_targets.contains(&id) != targeted {
                    continue;
                }
                if let Some(choice) = self.select_installed(state, ctx, id, targeted) {
                    return Some(choice);
                }
            }
        }

        // Requirements of packages that will be installed, installed system first
        for installed_first in [true, false] {
            for rule in state.rules.rules_of_type(RuleType::PackageRequires) {
                let Some(source) = rule.source() else {
                    continue;
                };
                if rule.is_disabled()
                    || pool.is_installed(source) != installed_first
                    || !decisions.decided_install(source)
                {
                    continue;
                }
                if let Some(choice) =
                    self.choose(state, ctx, rule.literals(), true, DecisionReason::Required { by: source })
                {
                    return Some(choice);
                }
            }
        }

        // Weak dependencies
        for (source, providers) in &ctx.recommends {
            if !decisions.decided_install(*source) || providers.iter().any(|&p| decisions.decided_install(p)) {
                continue;
            }
            let undecided: Vec<SolvableId> = providers.iter().copied().filter(|&p| decisions.undecided(p)).collect();
            let sorted = ctx.policy.select_preferred(pool, &undecided);
            if let Some((&best, rest)) = sorted.split_first() {
                return Some(Choice {
                    literal: literal(best, true),
                    alternatives: rest.to_vec(),
                    reason: DecisionReason::Recommended { by: *source },
                });
            }
        }
        for (candidate, targets) in &ctx.supplements {
            if !decisions.undecided(*candidate) {
                continue;
            }
            if let Some(&of) = targets.iter().find(|&&t| decisions.decided_install(t)) {
                return Some(Choice {
                    literal: literal(*candidate, true),
                    alternatives: Vec::new(),
                    reason: DecisionReason::Supplements { of },
                });
            }
        }

        // Everything else stays uninstalled
        ctx.universe
            .iter()
            .copied()
            .find(|&id| decisions.undecided(id))
            .map(|id| Choice {
                literal: literal(id, false),
                alternatives: Vec::new(),
                reason: if ctx.cleanable(id, &state.dropped_jobs) {
                    DecisionReason::Unneeded
                } else {
                    DecisionReason::Other
                },
            })
    }

    /// Keep an installed solvable or move it to an update candidate
    fn select_installed(
        &self,
        state: &SolverState,
        ctx: &SearchContext,
        id: SolvableId,
        targeted: bool,
    ) -> Option<Choice> {
        let update_rule = ctx
            .update_rules
            .get(&id)
            .and_then(|&rule_id| state.rules.get(rule_id))
            .filter(|rule| !rule.is_disabled());

        let update = |rule: &Rule| self.choose(state, ctx, rule.literals(), false, DecisionReason::Update { of: id });

        if state.decisions.undecided(id) {
            // Left to requirements of what stays; stage 5 removes it otherwise
            if ctx.cleanable(id, &state.dropped_jobs) {
                return None;
            }
            if let Some(mut choice) = update_rule.filter(|_| targeted).and_then(update) {
                if choice.literal == literal(id, true) {
                    choice.reason = DecisionReason::Installed;
                }
                return Some(choice);
            }
            return Some(Choice {
                literal: literal(id, true),
                alternatives: Vec::new(),
                reason: DecisionReason::Installed,
            });
        }

        if state.decisions.decided_remove(id) {
            return update_rule.and_then(update);
        }

        None
    }

    /// Choose the best undecided positive literal of an unsatisfied rule
    fn choose(
        &self,
        state: &SolverState,
        ctx: &SearchContext,
        literals: &[Literal],
        prefer_installed: bool,
        reason: DecisionReason,
    ) -> Option<Choice> {
        if literals.iter().any(|&lit| state.decisions.satisfied(lit)) {
            return None;
        }

        let candidates: Vec<SolvableId> = literals
            .iter()
            .filter(|&&lit| lit > 0)
            .map(|&lit| literal_solvable(lit))
            .filter(|&id| state.decisions.undecided(id))
            .collect();

        let sorted = if prefer_installed {
            ctx.policy.select_preferred_installed(self.pool, &candidates)
        } else {
            ctx.policy.select_preferred(self.pool, &candidates)
        };

        let (&best, rest) = sorted.split_first()?;
        Some(Choice {
            literal: literal(best, true),
            alternatives: rest.to_vec(),
            reason,
        })
    }

    /// Analyze a conflict using the first-UIP scheme.
    ///
    /// Returns the learned literals (the asserting literal first, the literal
    /// with the highest remaining level second), the level to go back to and
    /// the rules the learned rule was derived from. Level 1 literals are left
    /// out of the learned rule.
    fn analyze_conflict(&self, state: &SolverState, conflict_rule: u32) -> Result<Analysis, String> {
        let level = state.decisions.level();
        let queue = state.decisions.queue();
        let mut seen = vec![false; self.pool.len() + 1];
        let mut learned: Vec<Literal> = Vec::new();
        let mut why = vec![conflict_rule];
        let mut pending = 0usize;
        let mut backjump = 1u32;
        let mut rule_id = conflict_rule;
        let mut index = queue.len();

        loop {
            if let Some(rule) = state.rules.get(rule_id) {
                for &lit in rule.literals() {
                    let var = lit.unsigned_abs() as usize;
                    if var >= seen.len() || seen[var] {
                        continue;
                    }
                    seen[var] = true;
                    match state.decisions.decision_level(lit) {
                        Some(l) if l == level => pending += 1,
                        Some(l) if l > 1 => {
                            learned.push(lit);
                            backjump = backjump.max(l);
                        }
                        _ => {}
                    }
                }
            }

            if pending == 0 {
                return self.decision_clause(state, conflict_rule);
            }

            // Most recent literal on the trail taking part in the conflict
            let mut trail_lit = None;
            while index > 0 {
                index -= 1;
                let (lit, _) = queue[index];
                if seen[lit.unsigned_abs() as usize] {
                    trail_lit = Some(lit);
                    break;
                }
            }
            let Some(trail_lit) = trail_lit else {
                return self.decision_clause(state, conflict_rule);
            };

            pending -= 1;
            if pending == 0 {
                if let Some(pos) = (0..learned.len()).max_by_key(|&i| state.decisions.decision_level(learned[i])) {
                    learned.swap(0, pos);
                }
                let mut literals = Vec::with_capacity(learned.len() + 1);
                literals.push(-trail_lit);
                literals.extend(learned);
                return Ok((literals, backjump, why));
            }

            match state.decisions.decision_rule(trail_lit) {
                Some(reason) => {
                    rule_id = reason;
                    why.push(reason);
                }
                None => return self.decision_clause(state, conflict_rule),
            }
        }
    }

    /// Learned rule negating every branch decision, newest first
    fn decision_clause(&self, state: &SolverState, conflict_rule: u32) -> Result<Analysis, String> {
        let literals: Vec<Literal> = state
            .branches
            .iter()
            .rev()
            .filter(|b| b.level > 1)
            .map(|b| -b.literal)
            .collect();
        if literals.is_empty() {
            return Err(format!(
                "conflict in rule {} at level {} without branch decisions",
                conflict_rule,
                state.decisions.level()
            ));
        }
        let backjump = state
            .branches
            .iter()
            .rev()
            .nth(1)
            .map(|b| b.level)
            .unwrap_or(1)
            .max(1);
        Ok((literals, backjump, vec![conflict_rule]))
    }

    /// Collect the base rules responsible for a conflict at level 1
    fn analyze_unsolvable(&self, state: &SolverState, conflict_rule: u32) -> Vec<u32> {
        let mut involved = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![conflict_rule];

        while let Some(rule_id) = stack.pop() {
            if !visited.insert(rule_id) {
                continue;
            }
            let Some(rule) = state.rules.get(rule_id) else {
                continue;
            };

            if rule.rule_type() == RuleType::Learned {
                stack.extend(rule.why().iter().copied());
            } else {
                involved.insert(rule_id);
            }

            for &lit in rule.literals() {
                if let Some(reason) = state.decisions.decision_rule(lit) {
                    stack.push(reason);
                }
            }
        }

        involved.into_iter().collect()
    }

    /// Make an unsolvable rule set solvable again by dropping the weakest
    /// weak rule, or by recording a problem and disabling the involved jobs
    /// (the involved update rules when no job takes part). Returns false
    /// when nothing could be disabled.
    fn relax(
        &self,
        state: &mut SolverState,
        ctx: &SearchContext,
        involved: &[u32],
        problems: &mut ProblemSet,
        ignored_jobs: &mut BTreeSet<usize>,
    ) -> bool {
        let weakest = involved
            .iter()
            .rev()
            .copied()
            .find(|&id| state.rules.get(id).is_some_and(|r| r.is_weak() && !r.is_disabled()));

        if let Some(rule_id) = weakest {
            match state.rules.get(rule_id).and_then(|r| r.job_index()) {
                Some(job) => {
                    log::warn!("Ignoring weak job #{} to find a solution", job);
                    ignored_jobs.insert(job);
                    self.disable_job(state, ctx, job);
                }
                None => {
                    if let Some(source) = state.rules.get(rule_id).and_then(|r| r.source()) {
                        log::warn!("Allowing removal of {}", self.pool.solvable_str(source));
                    }
                    state.rules.disable(rule_id);
                }
            }
            return true;
        }

        let rules: Vec<&Rule> = involved.iter().filter_map(|&id| state.rules.get(id)).collect();
        let problem = Problem::from_rules(self.pool, &rules, self.flags);
        log::debug!(
            "Problem {} ({}): {} rule(s) involved",
            problems.len() + 1,
            problem.kind,
            rules.len()
        );
        problems.add(problem);

        // Update rules only give way when no job is to blame, so a later
        // job running into the same installed solvable is still reported
        let jobs: BTreeSet<usize> = involved
            .iter()
            .filter_map(|&id| state.rules.get(id))
            .filter(|rule| rule.rule_type() == RuleType::Job)
            .filter_map(|rule| rule.job_index())
            .collect();
        if !jobs.is_empty() {
            for job in jobs {
                self.disable_job(state, ctx, job);
            }
            return true;
        }

        let updates: Vec<u32> = involved
            .iter()
            .copied()
            .filter(|&id| state.rules.get(id).is_some_and(|r| r.rule_type() == RuleType::Update))
            .collect();
        for &rule_id in &updates {
            state.rules.disable(rule_id);
        }
        !updates.is_empty()
    }

    /// Disable the rules of a job. Update rules that were only disabled in
    /// favour of dropped jobs are enabled again.
    fn disable_job(&self, state: &mut SolverState, ctx: &SearchContext, job: usize) {
        for &rule_id in ctx.job_rules.get(&job).into_iter().flatten() {
            state.rules.disable(rule_id);
        }
        if !state.dropped_jobs.insert(job) {
            return;
        }

        for (&rule_id, owners) in &ctx.update_blockers {
            if owners.contains(&job) && owners.iter().all(|j| state.dropped_jobs.contains(j)) {
                log::debug!("Enabling update rule {} again after dropping job #{}", rule_id, job);
                state.rules.enable(rule_id);
            }
        }
    }

    /// Why a solvable ended up installed or removed
    fn reason_for(&self, state: &SolverState, id: SolvableId) -> DecisionReason {
        let install = state.decisions.decided_install(id);
        let lit = literal(id, install);

        let Some(rule) = state.decisions.decision_rule(lit).and_then(|r| state.rules.get(r)) else {
            return state
                .branches
                .iter()
                .find(|b| b.literal == lit)
                .map(|b| b.reason)
                .unwrap_or(DecisionReason::Other);
        };

        let other = match (rule.source(), rule.target()) {
            (Some(source), Some(target)) if source == id => Some(target),
            (Some(source), _) => Some(source),
            _ => None,
        };

        match (rule.rule_type(), install) {
            (RuleType::Job, _) => rule.job_index().map(DecisionReason::Job).unwrap_or(DecisionReason::Other),
            (RuleType::PackageRequires, true) => rule
                .source()
                .map(|by| DecisionReason::Required { by })
                .unwrap_or(DecisionReason::Other),
            (RuleType::Update, true) => match rule.source() {
                Some(source) if source == id => DecisionReason::Installed,
                Some(of) => DecisionReason::Update { of },
                None => DecisionReason::Other,
            },
            (RuleType::PackageObsoletes | RuleType::InstalledObsoletes, false) if rule.target() == Some(id) => rule
                .source()
                .map(|by| DecisionReason::Obsoleted { by })
                .unwrap_or(DecisionReason::Other),
            (
                RuleType::PackageConflict
                | RuleType::PackageObsoletes
                | RuleType::InstalledObsoletes
                | RuleType::PackageSameName,
                false,
            ) => other
                .map(|with| DecisionReason::Conflict { with })
                .unwrap_or(DecisionReason::Other),
            _ => DecisionReason::Other,
        }
    }

    /// Recommended and suggested solvables the result leaves uninstalled
    fn collect_hints(&self, result: &BTreeSet<SolvableId>) -> (Vec<SolvableId>, Vec<SolvableId>) {
        let pool = self.pool;
        let mut recommended = BTreeSet::new();
        let mut suggested = BTreeSet::new();

        for &id in result {
            let Some(solvable) = pool.solvable(id) else {
                continue;
            };
            for rel in &solvable.deps.recommends {
                recommended.extend(pool.providers(rel).into_iter().filter(|p| !result.contains(p)));
            }
            for rel in &solvable.deps.suggests {
                suggested.extend(pool.providers(rel).into_iter().filter(|p| !result.contains(p)));
            }
        }

        for id in pool.solvable_ids() {
            if result.contains(&id) || !pool.installable(id) {
                continue;
            }
            let Some(solvable) = pool.solvable(id) else {
                continue;
            };
            let enhances = solvable
                .deps
                .enhances
                .iter()
                .any(|rel| pool.providers(rel).iter().any(|p| result.contains(p)));
            if enhances {
                suggested.insert(id);
            }
        }

        (recommended.into_iter().collect(), suggested.into_iter().collect())
    }
}

/// Read-only data shared by every search of one solve
struct SearchContext {
    policy: Policy,
    universe: Vec<SolvableId>,
    installed: Vec<SolvableId>,
    update_rules: IndexMap<SolvableId, u32>,
    update_targets: BTreeSet<SolvableId>,
    job_rules: IndexMap<usize, Vec<u32>>,
    update_blockers: IndexMap<u32, Vec<usize>>,
    clean_deps: IndexMap<SolvableId, Vec<usize>>,
    /// (recommending solvable, providers of one recommends in the universe)
    recommends: Vec<(SolvableId, Vec<SolvableId>)>,
    /// (supplementing solvable, universe solvables it supplements)
    supplements: Vec<(SolvableId, Vec<SolvableId>)>,
}

impl SearchContext {
    fn new(pool: &Pool, flags: SolverFlags, generated: GeneratedRules) -> (RuleSet, Self) {
        let GeneratedRules {
            rules,
            universe,
            installed,
            update_rules,
            update_targets,
            job_rules,
            update_blockers,
            clean_deps,
        } = generated;

        let in_universe = |id: &SolvableId| universe.binary_search(id).is_ok();
        let mut recommends = Vec::new();
        let mut supplements = Vec::new();

        if !flags.ignore_recommended {
            for &id in &universe {
                let Some(solvable) = pool.solvable(id) else {
                    continue;
                };
                for rel in &solvable.deps.recommends {
                    let providers: Vec<SolvableId> = pool.providers(rel).into_iter().filter(in_universe).collect();
                    if !providers.is_empty() {
                        recommends.push((id, providers));
                    }
                }

                if !pool.installable(id) {
                    continue;
                }
                let mut targets: Vec<SolvableId> = solvable
                    .deps
                    .supplements
                    .iter()
                    .chain(&solvable.deps.freshens)
                    .flat_map(|rel| pool.providers(rel))
                    .filter(in_universe)
                    .collect();
                targets.sort_unstable();
                targets.dedup();
                if !targets.is_empty() {
                    supplements.push((id, targets));
                }
            }
        }

        let ctx = Self {
            policy: Policy::new(flags),
            universe,
            installed,
            update_rules,
            update_targets,
            job_rules,
            update_blockers,
            clean_deps,
            recommends,
            supplements,
        };
        (rules, ctx)
    }

    /// Whether a cleandeps erase job that is still active may remove `id`
    fn cleanable(&self, id: SolvableId, dropped_jobs: &BTreeSet<usize>) -> bool {
        self.clean_deps
            .get(&id)
            .is_some_and(|jobs| jobs.iter().any(|job| !dropped_jobs.contains(job)))
    }
}

/// Internal state for the solver
struct SolverState {
    rules: RuleSet,
    /// Rules with an id of this or higher are learned
    first_learned: u32,
    decisions: Decisions,
    watch_graph: WatchGraph,
    branches: Vec<Branch>,
    /// Index of next decision to propagate
    propagate_index: usize,
    /// Jobs disabled by problems or dropped as weak, kept across restarts
    dropped_jobs: BTreeSet<usize>,
}

impl SolverState {
    fn new(rules: RuleSet, solvables: usize) -> Self {
        let watch_graph = WatchGraph::from_rules(&rules);
        Self {
            first_learned: rules.len() as u32,
            rules,
            decisions: Decisions::with_capacity(solvables),
            watch_graph,
            branches: Vec::new(),
            propagate_index: 0,
            dropped_jobs: BTreeSet::new(),
        }
    }

    /// Forget decisions and learned rules, keeping disabled rules disabled
    fn restart(&mut self) {
        self.rules.truncate(self.first_learned);
        self.decisions.reset();
        self.watch_graph = WatchGraph::from_rules(&self.rules);
        self.branches.clear();
        self.propagate_index = 0;
    }
}

/// A branch point of the search
#[derive(Debug, Clone)]
struct Branch {
    level: u32,
    literal: Literal,
    alternatives: Vec<SolvableId>,
    reason: DecisionReason,
}

/// A free decision proposed by `select_next`
#[derive(Debug, Clone)]
struct Choice {
    literal: Literal,
    alternatives: Vec<SolvableId>,
    reason: DecisionReason,
}

/// Learned literals, backjump level and the rules they were derived from
type Analysis = (Vec<Literal>, u32, Vec<u32>);

enum SatResult {
    Solved,
    Unsolvable(u32),
    Aborted,
    Internal(String),
}

/// Step and time limit of one solve
struct Budget {
    max_steps: Option<u64>,
    deadline: Option<Instant>,
    steps: u64,
}

impl Budget {
    fn new(max_steps: Option<u64>, timeout: Option<Duration>) -> Self {
        Self {
            max_steps,
            deadline: timeout.map(|t| Instant::now() + t),
            steps: 0,
        }
    }

    /// Count one step and report whether the budget is used up
    fn exhausted(&mut self) -> bool {
        self.steps += 1;
        self.max_steps.is_some_and(|max| self.steps > max)
            || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_without_branches_is_internal_error() {
        let mut pool = Pool::new();
        let repo = pool.create_repo("repo").unwrap();
        let a = pool.add_solvable_with(repo, "A", "1", "noarch", &[]).unwrap();
        let b = pool.add_solvable_with(repo, "B", "1", "noarch", &[]).unwrap();
        pool.prepare();

        let mut rules = RuleSet::new();
        let conflict = rules.add(Rule::new(vec![literal(a, false), literal(b, false)], RuleType::PackageConflict));
        let mut state = SolverState::new(rules, pool.len());
        state.decisions.increment_level();
        state.decisions.increment_level();
        state.decisions.decide(literal(a, true), None);
        state.decisions.decide(literal(b, true), None);

        let solver = Solver::new(&pool);
        let err = solver.analyze_conflict(&state, conflict).unwrap_err();
        assert!(err.contains("without branch decisions"));
    }

    #[test]
    fn test_decision_clause_negates_branches() {
        let mut pool = Pool::new();
        let repo = pool.create_repo("repo").unwrap();
        let a = pool.add_solvable_with(repo, "A", "1", "noarch", &[]).unwrap();
        let b = pool.add_solvable_with(repo, "B", "1", "noarch", &[]).unwrap();
        pool.prepare();

        let mut state = SolverState::new(RuleSet::new(), pool.len());
        for (level, id) in [(2, a), (3, b)] {
            state.branches.push(Branch {
                level,
                literal: literal(id, true),
                alternatives: Vec::new(),
                reason: DecisionReason::Other,
            });
        }

        let (literals, backjump, why) = Solver::new(&pool).decision_clause(&state, 7).unwrap();
        assert_eq!(literals, vec![literal(b, false), literal(a, false)]);
        assert!(literals.iter().all(|&lit| lit != 0));
        assert_eq!(backjump, 2);
        assert_eq!(why, vec![7]);
    }
}
