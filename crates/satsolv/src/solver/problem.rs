use std::cmp::Ordering;
use std::fmt;

use super::rule::{Rule, RuleType};
use crate::config::SolverFlags;
use crate::pool::{Pool, Relation, SolvableId};

/// Why a problem occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    /// An installed package can neither stay nor be updated
    UpdateRule,
    /// Jobs contradict each other
    JobRule,
    /// A job matches no installable solvable
    JobNothingProvides,
    NotInstallable,
    NothingProvidesDep,
    SameNameConflict,
    PackageConflict,
    PackageObsoletes,
    /// Providers of a requirement exist but none of them can be installed
    DepProvidersNotInstallable,
    /// The step or time budget ran out before the search finished
    SearchAborted,
}

impl ProblemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemKind::UpdateRule => "update-rule",
            ProblemKind::JobRule => "job-rule",
            ProblemKind::JobNothingProvides => "job-nothing-provides",
            ProblemKind::NotInstallable => "not-installable",
            ProblemKind::NothingProvidesDep => "nothing-provides-dep",
            ProblemKind::SameNameConflict => "same-name-conflict",
            ProblemKind::PackageConflict => "package-conflict",
            ProblemKind::PackageObsoletes => "package-obsoletes",
            ProblemKind::DepProvidersNotInstallable => "dep-providers-not-installable",
            ProblemKind::SearchAborted => "search-aborted",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule that contributes to a problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemRule {
    pub rule_id: u32,
    pub rule_type: RuleType,
    pub source: Option<SolvableId>,
    pub target: Option<SolvableId>,
    pub relation: Option<Relation>,
    pub job: Option<usize>,
    /// Candidates of a job rule
    pub candidates: Vec<SolvableId>,
}

impl From<&Rule> for ProblemRule {
    fn from(rule: &Rule) -> Self {
        let candidates = if rule.rule_type() == RuleType::Job {
            rule.literals()
                .iter()
                .map(|&lit| SolvableId(lit.unsigned_abs()))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            rule_id: rule.id(),
            rule_type: rule.rule_type(),
            source: rule.source(),
            target: rule.target(),
            relation: rule.relation(),
            job: rule.job_index(),
            candidates,
        }
    }
}

impl ProblemRule {
    pub fn describe(&self, pool: &Pool) -> String {
        let source = name_of(pool, self.source);
        let target = name_of(pool, self.target);
        let relation = self
            .relation
            .map(|r| pool.relation_str(&r))
            .unwrap_or_else(|| "unknown".to_string());

        match self.rule_type {
            RuleType::NotInstallable => format!("{} is not installable", source),
            RuleType::NothingProvidesDep => format!("nothing provides {} needed by {}", relation, source),
            RuleType::PackageRequires => format!("{} requires {}", source, relation),
            RuleType::PackageSameName => format!("cannot install both {} and {}", source, target),
            RuleType::PackageConflict => {
                format!("{} conflicts with {} provided by {}", source, relation, target)
            }
            RuleType::PackageObsoletes | RuleType::InstalledObsoletes => {
                format!("{} obsoletes {} provided by {}", source, relation, target)
            }
            RuleType::Update => format!("installed {} must stay or be updated", source),
            RuleType::Job => {
                let index = self.job.map(|j| format!("#{}", j)).unwrap_or_default();
                if self.candidates.is_empty() {
                    format!("job {} matches no installable package", index)
                } else {
                    let names: Vec<_> = self.candidates.iter().map(|&c| pool.solvable_str(c)).collect();
                    format!("job {} selects {}", index, names.join(" | "))
                }
            }
            RuleType::Learned => "learned constraint from conflict analysis".to_string(),
        }
    }
}

fn name_of(pool: &Pool, id: Option<SolvableId>) -> String {
    id.map(|id| pool.solvable_str(id))
        .unwrap_or_else(|| "unknown".to_string())
}

/// A way for the caller to make a problem go away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Solution {
    /// Remove the job at this queue index
    DropJob(usize),
    /// Set `allow-uninstall` so this installed solvable may be removed
    AllowUninstall(SolvableId),
    /// Set `allow-downgrade`
    AllowDowngrade,
}

impl Solution {
    pub fn describe(&self, pool: &Pool) -> String {
        match self {
            Solution::DropJob(index) => format!("drop job #{}", index),
            Solution::AllowUninstall(id) => format!("allow removal of {}", pool.solvable_str(*id)),
            Solution::AllowDowngrade => "allow downgrades".to_string(),
        }
    }
}

/// One unsatisfiable set of constraints.
///
/// `kind`, `source`, `relation` and `target` come from the most specific
/// rule involved; `rules` lists every involved base rule in id order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub kind: ProblemKind,
    pub source: Option<SolvableId>,
    pub relation: Option<Relation>,
    pub target: Option<SolvableId>,
    pub job: Option<usize>,
    pub rules: Vec<ProblemRule>,
    /// Indices of the jobs involved
    pub jobs: Vec<usize>,
    pub solutions: Vec<Solution>,
}

impl Problem {
    /// Build a problem from the base rules involved in a conflict
    pub(crate) fn from_rules(pool: &Pool, rules: &[&Rule], flags: SolverFlags) -> Self {
        let headline = rules.iter().copied().min_by(|a, b| {
            a.rule_type()
                .problem_rank()
                .cmp(&b.rule_type().problem_rank())
                .then_with(|| a.id().cmp(&b.id()))
        });

        let kind = headline.map(|rule| kind_of(pool, rule)).unwrap_or(ProblemKind::JobRule);

        let mut jobs: Vec<usize> = rules.iter().filter_map(|r| r.job_index()).collect();
        jobs.sort_unstable();
        jobs.dedup();

        let mut solutions: Vec<Solution> = rules
            .iter()
            .filter(|r| r.rule_type() == RuleType::Job)
            .filter_map(|r| r.job_index())
            .map(Solution::DropJob)
            .collect();
        solutions.sort_by(compare_solutions);
        solutions.dedup();

        let updated: Vec<SolvableId> = rules
            .iter()
            .filter(|r| r.rule_type() == RuleType::Update)
            .filter_map(|r| r.source())
            .collect();
        if !flags.allow_uninstall {
            solutions.extend(updated.iter().map(|&id| Solution::AllowUninstall(id)));
        }
        if !flags.allow_downgrade && updated.iter().any(|&id| has_older_version(pool, id)) {
            solutions.push(Solution::AllowDowngrade);
        }

        let mut problem_rules: Vec<ProblemRule> = rules.iter().map(|&r| ProblemRule::from(r)).collect();
        problem_rules.sort_by_key(|r| r.rule_id);

        Self {
            kind,
            source: headline.and_then(|r| r.source()),
            relation: headline.and_then(|r| r.relation()),
            target: headline.and_then(|r| r.target()),
            job: headline.and_then(|r| r.job_index()),
            rules: problem_rules,
            jobs,
            solutions,
        }
    }

    pub(crate) fn aborted() -> Self {
        Self {
            kind: ProblemKind::SearchAborted,
            source: None,
            relation: None,
            target: None,
            job: None,
            rules: Vec::new(),
            jobs: Vec::new(),
            solutions: Vec::new(),
        }
    }

    /// Generate a human-readable description of this problem
    pub fn describe(&self, pool: &Pool) -> String {
        let source = name_of(pool, self.source);
        let target = name_of(pool, self.target);
        let relation = self
            .relation
            .map(|r| pool.relation_str(&r))
            .unwrap_or_else(|| "unknown".to_string());

        let headline = match self.kind {
            ProblemKind::UpdateRule => format!("problem with installed package {}", source),
            ProblemKind::JobRule => "conflicting requests".to_string(),
            ProblemKind::JobNothingProvides => match self.job {
                Some(job) => format!("nothing provides the package requested by job #{}", job),
                None => "nothing provides the requested package".to_string(),
            },
            ProblemKind::NotInstallable => format!("package {} is not installable", source),
            ProblemKind::NothingProvidesDep => {
                format!("nothing provides {} needed by {}", relation, source)
            }
            ProblemKind::SameNameConflict => {
                format!("cannot install both {} and {}", source, target)
            }
            ProblemKind::PackageConflict => {
                format!("package {} conflicts with {} provided by {}", source, relation, target)
            }
            ProblemKind::PackageObsoletes => {
                format!("package {} obsoletes {} provided by {}", source, relation, target)
            }
            ProblemKind::DepProvidersNotInstallable => format!(
                "package {} requires {}, but none of the providers can be installed",
                source, relation
            ),
            ProblemKind::SearchAborted => "search aborted before a solution was found".to_string(),
        };

        let mut lines = vec![headline];
        for rule in &self.rules {
            lines.push(format!("  - {}", rule.describe(pool)));
        }
        for solution in &self.solutions {
            lines.push(format!("  Solution: {}", solution.describe(pool)));
        }
        lines.join("\n")
    }
}

fn kind_of(pool: &Pool, rule: &Rule) -> ProblemKind {
    match rule.rule_type() {
        RuleType::NotInstallable => ProblemKind::NotInstallable,
        RuleType::NothingProvidesDep => {
            // Providers that exist but are filtered out by architecture
            let uninstallable = rule.relation().is_some_and(|rel| {
                pool.whatprovides_index()
                    .map(|index| index.get(rel.name).iter().any(|&p| pool.matches(p, &rel)))
                    .unwrap_or(false)
            });
            if uninstallable {
                ProblemKind::DepProvidersNotInstallable
            } else {
                ProblemKind::NothingProvidesDep
            }
        }
        RuleType::PackageRequires => ProblemKind::DepProvidersNotInstallable,
        RuleType::PackageSameName => ProblemKind::SameNameConflict,
        RuleType::PackageConflict => ProblemKind::PackageConflict,
        RuleType::PackageObsoletes | RuleType::InstalledObsoletes => ProblemKind::PackageObsoletes,
        RuleType::Update => ProblemKind::UpdateRule,
        RuleType::Job if rule.is_empty() => ProblemKind::JobNothingProvides,
        RuleType::Job | RuleType::Learned => ProblemKind::JobRule,
    }
}

fn has_older_version(pool: &Pool, installed: SolvableId) -> bool {
    let Some(solvable) = pool.solvable(installed) else {
        return false;
    };
    pool.same_name(solvable.name)
        .into_iter()
        .any(|id| !pool.is_installed(id) && pool.compare_evr_of(id, installed) == Ordering::Less)
}

fn compare_solutions(a: &Solution, b: &Solution) -> Ordering {
    match (a, b) {
        (Solution::DropJob(x), Solution::DropJob(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

/// Collection of problems encountered during solving
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemSet {
    problems: Vec<Problem>,
}

impl ProblemSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn iter(&self) -> impl Iterator<Item = &Problem> {
        self.problems.iter()
    }

    /// True when the search ran out of budget
    pub fn is_aborted(&self) -> bool {
        self.problems.iter().any(|p| p.kind == ProblemKind::SearchAborted)
    }

    /// Generate a complete description of all problems
    pub fn describe(&self, pool: &Pool) -> String {
        let descriptions: Vec<_> = self
            .problems
            .iter()
            .enumerate()
            .map(|(i, p)| format!("Problem {}: {}", i + 1, p.describe(pool)))
            .collect();

        if descriptions.is_empty() {
            "No problems found".to_string()
        } else {
            descriptions.join("\n\n")
        }
    }
}

impl<'a> IntoIterator for &'a ProblemSet {
    type Item = &'a Problem;
    type IntoIter = std::slice::Iter<'a, Problem>;

    fn into_iter(self) -> Self::IntoIter {
        self.problems.iter()
    }
}

impl fmt::Display for ProblemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} problem(s) found", self.problems.len())
    }
}
