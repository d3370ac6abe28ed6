use std::fmt;
use std::hash::{Hash, Hasher};

use crate::pool::{Relation, SolvableId};

/// A literal in SAT terms - positive means "install", negative means "don't install"
pub type Literal = i32;

/// Literal for installing (`true`) or not installing a solvable
pub fn literal(id: SolvableId, install: bool) -> Literal {
    let lit = id.as_u32() as Literal;
    if install {
        lit
    } else {
        -lit
    }
}

/// The solvable a literal refers to
pub fn literal_solvable(literal: Literal) -> SolvableId {
    SolvableId(literal.unsigned_abs())
}

/// Types of rules generated during dependency resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleType {
    /// The solvable's architecture is incompatible with the pool
    NotInstallable,
    /// A requirement of the solvable has no provider at all
    NothingProvidesDep,
    /// If A is installed, one of the providers of its requirement must be
    PackageRequires,
    /// Two versions of the same name cannot both be installed
    PackageSameName,
    /// A conflicts with a provider of one of its conflicts
    PackageConflict,
    /// A obsoletes B, they cannot both be installed
    PackageObsoletes,
    /// An installed package obsoletes a package that is not installed
    InstalledObsoletes,
    /// An installed package stays or is replaced by one of its updates
    Update,
    /// Derived from a job of the queue
    Job,
    /// Learned clause from conflict analysis
    Learned,
}

impl RuleType {
    pub fn is_package_rule(&self) -> bool {
        !matches!(self, RuleType::Update | RuleType::Job | RuleType::Learned)
    }

    /// Rank used to pick the headline rule of a problem, lower is more specific
    pub(crate) fn problem_rank(&self) -> u8 {
        match self {
            RuleType::NothingProvidesDep | RuleType::NotInstallable => 0,
            RuleType::PackageConflict
            | RuleType::PackageObsoletes
            | RuleType::InstalledObsoletes
            | RuleType::PackageSameName => 1,
            RuleType::PackageRequires => 2,
            RuleType::Update => 3,
            RuleType::Job => 4,
            RuleType::Learned => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::NotInstallable => "not-installable",
            RuleType::NothingProvidesDep => "nothing-provides",
            RuleType::PackageRequires => "requires",
            RuleType::PackageSameName => "same-name",
            RuleType::PackageConflict => "conflict",
            RuleType::PackageObsoletes => "obsoletes",
            RuleType::InstalledObsoletes => "installed-obsoletes",
            RuleType::Update => "update",
            RuleType::Job => "job",
            RuleType::Learned => "learned",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SAT rule (clause) representing a dependency constraint.
///
/// Rules are disjunctions (OR) of literals. A rule is satisfied when
/// at least one of its literals is true.
///
/// # Examples
///
/// - `[A]` - Package A must be installed (assertion)
/// - `[-A]` - Package A must not be installed
/// - `[-A, B, C]` - If A is installed, then B or C must be installed
/// - `[-A, -B]` - A and B cannot both be installed (conflict)
/// - `[]` - Unsatisfiable, e.g. a job nothing provides
#[derive(Debug, Clone)]
pub struct Rule {
    literals: Vec<Literal>,
    rule_type: RuleType,
    /// Rule ID (assigned by RuleSet)
    id: u32,
    source: Option<SolvableId>,
    target: Option<SolvableId>,
    relation: Option<Relation>,
    /// Index of the job this rule was generated from
    job: Option<usize>,
    /// Rules a learned rule was derived from
    why: Vec<u32>,
    /// Weak rules may be disabled to make the problem solvable
    weak: bool,
    disabled: bool,
}

impl Rule {
    pub fn new(literals: Vec<Literal>, rule_type: RuleType) -> Self {
        Self {
            literals,
            rule_type,
            id: 0,
            source: None,
            target: None,
            relation: None,
            job: None,
            why: Vec::new(),
            weak: false,
            disabled: false,
        }
    }

    pub fn not_installable(source: SolvableId) -> Self {
        Self::new(vec![literal(source, false)], RuleType::NotInstallable).with_source(source)
    }

    pub fn nothing_provides(source: SolvableId, relation: Relation) -> Self {
        Self::new(vec![literal(source, false)], RuleType::NothingProvidesDep)
            .with_source(source)
            .with_relation(relation)
    }

    /// If source is installed, one of the providers must be
    pub fn requires(source: SolvableId, providers: &[SolvableId], relation: Relation) -> Self {
        let mut literals = Vec::with_capacity(providers.len() + 1);
        literals.push(literal(source, false));
        literals.extend(providers.iter().map(|&p| literal(p, true)));
        Self::new(literals, RuleType::PackageRequires)
            .with_source(source)
            .with_relation(relation)
    }

    pub fn same_name(a: SolvableId, b: SolvableId) -> Self {
        Self::pair(a, b, RuleType::PackageSameName)
    }

    pub fn conflict(source: SolvableId, target: SolvableId, relation: Relation) -> Self {
        Self::pair(source, target, RuleType::PackageConflict).with_relation(relation)
    }

    pub fn obsoletes(source: SolvableId, target: SolvableId, relation: Relation) -> Self {
        Self::pair(source, target, RuleType::PackageObsoletes).with_relation(relation)
    }

    pub fn installed_obsoletes(source: SolvableId, target: SolvableId, relation: Relation) -> Self {
        Self::pair(source, target, RuleType::InstalledObsoletes).with_relation(relation)
    }

    fn pair(source: SolvableId, target: SolvableId, rule_type: RuleType) -> Self {
        Self::new(vec![literal(source, false), literal(target, false)], rule_type)
            .with_source(source)
            .with_target(target)
    }

    /// Keep the installed solvable or install one of its update candidates
    pub fn update(installed: SolvableId, candidates: &[SolvableId]) -> Self {
        let mut literals = Vec::with_capacity(candidates.len() + 1);
        literals.push(literal(installed, true));
        literals.extend(candidates.iter().map(|&c| literal(c, true)));
        Self::new(literals, RuleType::Update).with_source(installed)
    }

    pub fn job(literals: Vec<Literal>, job: usize) -> Self {
        let mut rule = Self::new(literals, RuleType::Job);
        rule.job = Some(job);
        rule
    }

    /// Create a learned rule from conflict analysis
    pub fn learned(literals: Vec<Literal>, why: Vec<u32>) -> Self {
        let mut rule = Self::new(literals, RuleType::Learned);
        rule.why = why;
        rule
    }

    pub fn with_source(mut self, source: SolvableId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_target(mut self, target: SolvableId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn with_weak(mut self, weak: bool) -> Self {
        self.weak = weak;
        self
    }

    pub fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn rule_type(&self) -> RuleType {
        self.rule_type
    }

    pub fn literals(&self) -> &[Literal] {
        &self.literals
    }

    pub fn source(&self) -> Option<SolvableId> {
        self.source
    }

    pub fn target(&self) -> Option<SolvableId> {
        self.target
    }

    pub fn relation(&self) -> Option<Relation> {
        self.relation
    }

    pub fn job_index(&self) -> Option<usize> {
        self.job
    }

    pub fn why(&self) -> &[u32] {
        &self.why
    }

    /// Check if this is an assertion (single literal)
    pub fn is_assertion(&self) -> bool {
        self.literals.len() == 1
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn is_weak(&self) -> bool {
        self.weak
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    /// Hash over the sorted literals, used for deduplication
    pub fn literal_hash(&self) -> u64 {
        let mut sorted = self.literals.clone();
        sorted.sort_unstable();
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        sorted.hash(&mut hasher);
        hasher.finish()
    }

    /// Hash over the rule type and the sorted literals. A missing
    /// requirement also hashes its relation, so each one is reported.
    pub fn dedup_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.rule_type.hash(&mut hasher);
        self.literal_hash().hash(&mut hasher);
        if self.rule_type == RuleType::NothingProvidesDep {
            self.relation.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Same type and literals, and the same relation for missing requirements
    pub fn is_duplicate_of(&self, other: &Rule) -> bool {
        self.rule_type == other.rule_type
            && self.equals_literals(other)
            && (self.rule_type != RuleType::NothingProvidesDep || self.relation == other.relation)
    }

    /// Check if two rules have the same literals (in any order)
    pub fn equals_literals(&self, other: &Rule) -> bool {
        if self.literals.len() != other.literals.len() {
            return false;
        }
        let mut a = self.literals.clone();
        let mut b = other.literals.clone();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u32) -> SolvableId {
        SolvableId(n)
    }

    #[test]
    fn test_literal_mapping() {
        assert_eq!(literal(sid(3), true), 3);
        assert_eq!(literal(sid(3), false), -3);
        assert_eq!(literal_solvable(-3), sid(3));
        assert_eq!(literal_solvable(7), sid(7));
    }

    #[test]
    fn test_requires_rule() {
        let rel = Relation::name_only(crate::pool::Id::EMPTY);
        let rule = Rule::requires(sid(1), &[sid(2), sid(3)], rel);
        assert_eq!(rule.literals(), &[-1, 2, 3]);
        assert_eq!(rule.rule_type(), RuleType::PackageRequires);
        assert_eq!(rule.source(), Some(sid(1)));
        assert!(!rule.is_assertion());
    }

    #[test]
    fn test_update_rule() {
        let rule = Rule::update(sid(4), &[sid(5)]);
        assert_eq!(rule.literals(), &[4, 5]);
        assert_eq!(rule.rule_type(), RuleType::Update);
    }

    #[test]
    fn test_equal_literals_any_order() {
        let a = Rule::same_name(sid(1), sid(2));
        let b = Rule::new(vec![-2, -1], RuleType::PackageConflict);
        assert!(a.equals_literals(&b));
        assert_eq!(a.literal_hash(), b.literal_hash());
    }

    #[test]
    fn test_problem_rank_order() {
        assert!(RuleType::NothingProvidesDep.problem_rank() < RuleType::PackageConflict.problem_rank());
        assert!(RuleType::PackageConflict.problem_rank() < RuleType::PackageRequires.problem_rank());
        assert!(RuleType::PackageRequires.problem_rank() < RuleType::Update.problem_rank());
        assert!(RuleType::Update.problem_rank() < RuleType::Job.problem_rank());
    }

    #[test]
    fn test_weak_and_disabled() {
        let mut rule = Rule::job(vec![1], 0).with_weak(true);
        assert!(rule.is_weak());
        assert_eq!(rule.job_index(), Some(0));
        rule.disable();
        assert!(rule.is_disabled());
        rule.enable();
        assert!(!rule.is_disabled());
    }
}
