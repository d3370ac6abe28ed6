use super::rule::Literal;
use crate::pool::SolvableId;

/// Tracks decisions made during SAT solving.
///
/// Each decision records:
/// - Whether a solvable is installed (+) or not installed (-)
/// - At what decision level it was decided
/// - Which rule caused the decision (`None` for free choices)
///
/// Uses flat Vecs indexed by solvable id for O(1) lookups.
/// The decision_map stores: 0 = undecided, >0 = installed at level N-1, <0 = not installed at level N-1
#[derive(Debug, Clone, Default)]
pub struct Decisions {
    decision_map: Vec<i32>,

    /// Rule that caused the decision of each solvable
    reasons: Vec<Option<u32>>,

    /// Queue of decisions in order made [(literal, rule_id)]
    decision_queue: Vec<(Literal, Option<u32>)>,

    level: u32,
}

impl Decisions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decisions tracker for solvable ids up to `max_id`
    pub fn with_capacity(max_id: usize) -> Self {
        Self {
            decision_map: vec![0; max_id + 1],
            reasons: vec![None; max_id + 1],
            decision_queue: Vec::with_capacity(max_id),
            level: 0,
        }
    }

    #[inline]
    fn ensure_capacity(&mut self, id: usize) {
        if id >= self.decision_map.len() {
            self.decision_map.resize(id + 1, 0);
            self.reasons.resize(id + 1, None);
        }
    }

    #[inline]
    fn value(&self, literal: Literal) -> i32 {
        self.decision_map
            .get(literal.unsigned_abs() as usize)
            .copied()
            .unwrap_or(0)
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn increment_level(&mut self) {
        self.level += 1;
    }

    /// Make a decision at the current level
    ///
    /// Returns false if this conflicts with an existing decision
    pub fn decide(&mut self, literal: Literal, rule_id: Option<u32>) -> bool {
        let id = literal.unsigned_abs() as usize;
        self.ensure_capacity(id);

        let existing = self.decision_map[id];
        if existing != 0 {
            return (existing > 0) == (literal > 0);
        }

        // Store level+1 so that level 0 doesn't become 0 (which means undecided)
        let level_value = (self.level + 1) as i32;
        self.decision_map[id] = if literal > 0 { level_value } else { -level_value };
        self.reasons[id] = rule_id;
        self.decision_queue.push((literal, rule_id));

        true
    }

    /// Check if a literal is satisfied by current decisions
    #[inline]
    pub fn satisfied(&self, literal: Literal) -> bool {
        let decision = self.value(literal);
        decision != 0 && (decision > 0) == (literal > 0)
    }

    /// Check if a literal conflicts with current decisions
    #[inline]
    pub fn conflict(&self, literal: Literal) -> bool {
        let decision = self.value(literal);
        decision != 0 && (decision > 0) != (literal > 0)
    }

    /// Truth value of a literal, `None` when undecided
    #[inline]
    pub fn value_of(&self, literal: Literal) -> Option<bool> {
        match self.value(literal) {
            0 => None,
            d => Some((d > 0) == (literal > 0)),
        }
    }

    #[inline]
    pub fn decided(&self, id: SolvableId) -> bool {
        self.value(id.as_u32() as Literal) != 0
    }

    #[inline]
    pub fn undecided(&self, id: SolvableId) -> bool {
        !self.decided(id)
    }

    #[inline]
    pub fn decided_install(&self, id: SolvableId) -> bool {
        self.value(id.as_u32() as Literal) > 0
    }

    #[inline]
    pub fn decided_remove(&self, id: SolvableId) -> bool {
        self.value(id.as_u32() as Literal) < 0
    }

    /// Get the decision level for a literal/solvable
    #[inline]
    pub fn decision_level(&self, literal: Literal) -> Option<u32> {
        match self.value(literal) {
            0 => None,
            d => Some(d.unsigned_abs() - 1),
        }
    }

    /// Get the rule that caused a decision
    #[inline]
    pub fn decision_rule(&self, literal: Literal) -> Option<u32> {
        if self.value(literal) == 0 {
            return None;
        }
        self.reasons
            .get(literal.unsigned_abs() as usize)
            .copied()
            .flatten()
    }

    /// Revert all decisions at levels > target_level
    pub fn revert_to_level(&mut self, target_level: u32) {
        let target = (target_level + 1) as i32;

        while let Some(&(literal, _)) = self.decision_queue.last() {
            let id = literal.unsigned_abs() as usize;
            if self.decision_map[id].abs() <= target {
                break;
            }
            self.decision_map[id] = 0;
            self.reasons[id] = None;
            self.decision_queue.pop();
        }

        self.level = target_level;
    }

    /// Solvables decided to be installed, in id order
    pub fn installed(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.decision_map
            .iter()
            .enumerate()
            .filter(|(_, &d)| d > 0)
            .map(|(id, _)| SolvableId(id as u32))
    }

    pub fn queue(&self) -> &[(Literal, Option<u32>)] {
        &self.decision_queue
    }

    pub fn len(&self) -> usize {
        self.decision_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decision_queue.is_empty()
    }

    pub fn reset(&mut self) {
        self.decision_map.fill(0);
        self.reasons.fill(None);
        self.decision_queue.clear();
        self.level = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(n: u32) -> SolvableId {
        SolvableId(n)
    }

    #[test]
    fn test_decisions_new() {
        let decisions = Decisions::new();
        assert_eq!(decisions.level(), 0);
        assert!(decisions.is_empty());
    }

    #[test]
    fn test_decisions_decide() {
        let mut decisions = Decisions::with_capacity(4);

        assert!(decisions.decide(1, Some(0)));
        assert!(decisions.satisfied(1));
        assert!(!decisions.satisfied(-1));
        assert!(decisions.decided_install(sid(1)));

        assert!(decisions.decide(-2, Some(1)));
        assert!(decisions.satisfied(-2));
        assert!(decisions.decided_remove(sid(2)));
        assert_eq!(decisions.value_of(2), Some(false));
        assert_eq!(decisions.value_of(-2), Some(true));
        assert_eq!(decisions.value_of(3), None);
    }

    #[test]
    fn test_decisions_conflict() {
        let mut decisions = Decisions::new();
        decisions.decide(1, None);

        assert!(!decisions.decide(-1, None));
        assert!(decisions.conflict(-1));
        assert!(!decisions.conflict(1));
    }

    #[test]
    fn test_decisions_levels() {
        let mut decisions = Decisions::new();
        decisions.increment_level();
        decisions.decide(1, None);
        assert_eq!(decisions.decision_level(1), Some(1));

        decisions.increment_level();
        decisions.decide(-2, None);
        assert_eq!(decisions.decision_level(2), Some(2));
        assert_eq!(decisions.decision_level(3), None);
    }

    #[test]
    fn test_decisions_revert() {
        let mut decisions = Decisions::new();

        decisions.increment_level();
        decisions.decide(1, Some(7));
        decisions.increment_level();
        decisions.decide(2, None);
        decisions.increment_level();
        decisions.decide(-3, Some(9));

        decisions.revert_to_level(1);

        assert!(decisions.decided(sid(1)));
        assert!(!decisions.decided(sid(2)));
        assert!(!decisions.decided(sid(3)));
        assert_eq!(decisions.decision_rule(-3), None);
        assert_eq!(decisions.decision_rule(1), Some(7));
        assert_eq!(decisions.level(), 1);
        assert_eq!(decisions.len(), 1);
    }

    #[test]
    fn test_decisions_installed() {
        let mut decisions = Decisions::new();
        decisions.decide(3, None);
        decisions.decide(-2, None);
        decisions.decide(1, None);

        let installed: Vec<_> = decisions.installed().collect();
        assert_eq!(installed, vec![sid(1), sid(3)]);
    }

    #[test]
    fn test_decisions_reset() {
        let mut decisions = Decisions::with_capacity(2);
        decisions.increment_level();
        decisions.decide(1, Some(0));
        decisions.reset();

        assert!(decisions.undecided(sid(1)));
        assert_eq!(decisions.level(), 0);
        assert!(decisions.is_empty());
    }
}
