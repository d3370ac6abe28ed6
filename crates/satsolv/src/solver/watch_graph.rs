use super::rule::{Literal, Rule};
use super::rule_set::RuleSet;

/// Two-watched literals graph for efficient unit propagation.
///
/// Each rule with two or more literals watches exactly 2 of them.
/// When a watched literal becomes false, we try to find another
/// literal to watch. The pair currently watched by each rule is
/// stored alongside the per-literal lists so moves never go stale.
#[derive(Debug, Clone, Default)]
pub struct WatchGraph {
    /// Literal index -> ids of the rules watching that literal
    watches: Vec<Vec<u32>>,

    /// Rule id -> the two literals it watches
    watched: Vec<Option<[Literal; 2]>>,
}

impl WatchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert literal to index (handles positive and negative literals)
    fn literal_to_index(literal: Literal) -> usize {
        let abs = literal.unsigned_abs() as usize;
        if literal > 0 {
            abs * 2
        } else {
            abs * 2 + 1
        }
    }

    fn get_watches_mut(&mut self, literal: Literal) -> &mut Vec<u32> {
        let idx = Self::literal_to_index(literal);
        if idx >= self.watches.len() {
            self.watches.resize(idx + 1, Vec::new());
        }
        &mut self.watches[idx]
    }

    /// Build the watch graph from a rule set, skipping disabled rules
    pub fn from_rules(rules: &RuleSet) -> Self {
        let mut graph = Self::new();

        for rule in rules.iter() {
            if rule.is_disabled() {
                continue;
            }
            graph.add_rule(rule);
        }

        graph
    }

    /// Watch the first two literals of a rule
    pub fn add_rule(&mut self, rule: &Rule) {
        let literals = rule.literals();
        if literals.len() < 2 {
            return; // Assertions and empty rules don't need watches
        }

        let rule_id = rule.id();
        let pair = [literals[0], literals[1]];

        let slot = rule_id as usize;
        if slot >= self.watched.len() {
            self.watched.resize(slot + 1, None);
        }
        self.watched[slot] = Some(pair);

        self.get_watches_mut(pair[0]).push(rule_id);
        self.get_watches_mut(pair[1]).push(rule_id);
    }

    /// Ids of the rules watching a literal
    #[cfg(test)]
    pub fn get_watches(&self, literal: Literal) -> &[u32] {
        let idx = Self::literal_to_index(literal);
        self.watches.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The literals a rule currently watches
    pub fn watched(&self, rule_id: u32) -> Option<[Literal; 2]> {
        self.watched.get(rule_id as usize).copied().flatten()
    }
}

/// Result of propagating a literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropagateResult {
    /// A new unit was found that must be propagated
    Unit(Literal, u32), // (literal to propagate, rule_id)
    /// A conflict was found
    Conflict(u32), // rule_id
}

/// Propagator handles unit propagation using the watch graph
#[derive(Debug)]
pub struct Propagator<'a> {
    graph: &'a mut WatchGraph,
    rules: &'a RuleSet,
}

impl<'a> Propagator<'a> {
    pub fn new(graph: &'a mut WatchGraph, rules: &'a RuleSet) -> Self {
        Self { graph, rules }
    }

    /// Propagate a decided literal through the watch graph.
    ///
    /// `literal` became true, so `-literal` became false. Every rule
    /// watching `-literal` either is satisfied by its other watch, moves
    /// the watch to a literal that is not false, becomes unit, or conflicts.
    pub fn propagate<F>(&mut self, literal: Literal, mut is_satisfied: F) -> Vec<PropagateResult>
    where
        F: FnMut(Literal) -> Option<bool>, // None = undecided
    {
        let mut results = Vec::new();
        let false_literal = -literal;

        let idx = WatchGraph::literal_to_index(false_literal);
        let Some(list) = self.graph.watches.get_mut(idx) else {
            return results;
        };
        let watching = std::mem::take(list);
        let mut kept = Vec::with_capacity(watching.len());

        for rule_id in watching {
            let (Some(rule), Some(pair)) = (self.rules.get(rule_id), self.graph.watched(rule_id)) else {
                continue;
            };

            if rule.is_disabled() {
                kept.push(rule_id);
                continue;
            }

            let other = if pair[0] == false_literal { pair[1] } else { pair[0] };
            if is_satisfied(other) == Some(true) {
                kept.push(rule_id);
                continue;
            }

            let replacement = rule
                .literals()
                .iter()
                .copied()
                .find(|&lit| lit != pair[0] && lit != pair[1] && is_satisfied(lit) != Some(false));

            if let Some(lit) = replacement {
                // Other literals never equal false_literal, so pushing here
                // doesn't touch the list being rebuilt
                self.graph.watched[rule_id as usize] = Some([other, lit]);
                self.graph.get_watches_mut(lit).push(rule_id);
                continue;
            }

            kept.push(rule_id);
            match is_satisfied(other) {
                None => results.push(PropagateResult::Unit(other, rule_id)),
                _ => results.push(PropagateResult::Conflict(rule_id)),
            }
        }

        self.graph.watches[idx] = kept;
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::rule::RuleType;

    #[test]
    fn test_watch_graph_add_rule() {
        let mut graph = WatchGraph::new();

        let mut rule = Rule::new(vec![1, 2, 3], RuleType::PackageRequires);
        rule.set_id(0);
        graph.add_rule(&rule);

        assert_eq!(graph.get_watches(1), &[0]);
        assert_eq!(graph.get_watches(2), &[0]);
        assert!(graph.get_watches(3).is_empty());
        assert_eq!(graph.watched(0), Some([1, 2]));
    }

    #[test]
    fn test_watch_graph_from_rules() {
        let mut rules = RuleSet::new();
        rules.add(Rule::new(vec![1, 2, 3], RuleType::PackageRequires));
        rules.add(Rule::new(vec![1, 4, 5], RuleType::PackageRequires));
        rules.add(Rule::job(vec![6], 0)); // Assertion, not watched

        let graph = WatchGraph::from_rules(&rules);

        assert_eq!(graph.get_watches(1).len(), 2);
        assert!(graph.get_watches(6).is_empty());
        assert_eq!(graph.watched(2), None);
    }

    #[test]
    fn test_propagator_unit() {
        let mut rules = RuleSet::new();
        // Rule: (-1 | 2 | 3) = if 1 then 2 or 3
        rules.add(Rule::new(vec![-1, 2, 3], RuleType::PackageRequires));
        let mut graph = WatchGraph::from_rules(&rules);

        let mut propagator = Propagator::new(&mut graph, &rules);
        let results = propagator.propagate(1, |lit| match lit {
            -1 => Some(false),
            3 => Some(false),
            _ => None,
        });

        assert_eq!(results, vec![PropagateResult::Unit(2, 0)]);
    }

    #[test]
    fn test_propagator_moves_watch() {
        let mut rules = RuleSet::new();
        rules.add(Rule::new(vec![-1, 2, 3], RuleType::PackageRequires));
        let mut graph = WatchGraph::from_rules(&rules);

        let mut propagator = Propagator::new(&mut graph, &rules);
        let results = propagator.propagate(1, |lit| match lit {
            -1 => Some(false),
            _ => None,
        });

        assert!(results.is_empty());
        assert!(graph.get_watches(-1).is_empty());
        assert_eq!(graph.get_watches(3), &[0]);
        assert_eq!(graph.watched(0), Some([2, 3]));
    }

    #[test]
    fn test_propagator_conflict() {
        let mut rules = RuleSet::new();
        // Rule: (-1 | 2) = if 1 then 2
        rules.add(Rule::new(vec![-1, 2], RuleType::PackageRequires));
        let mut graph = WatchGraph::from_rules(&rules);

        let mut propagator = Propagator::new(&mut graph, &rules);
        let results = propagator.propagate(1, |lit| match lit {
            -1 => Some(false),
            2 => Some(false),
            _ => None,
        });

        assert_eq!(results, vec![PropagateResult::Conflict(0)]);
        // The conflicting rule keeps its watch
        assert_eq!(graph.get_watches(-1), &[0]);
    }

    #[test]
    fn test_propagator_satisfied() {
        let mut rules = RuleSet::new();
        rules.add(Rule::new(vec![-1, 2, 3], RuleType::PackageRequires));
        let mut graph = WatchGraph::from_rules(&rules);

        let mut propagator = Propagator::new(&mut graph, &rules);
        let results = propagator.propagate(1, |lit| match lit {
            -1 => Some(false),
            2 => Some(true),
            _ => None,
        });

        assert!(results.is_empty());
        assert_eq!(graph.get_watches(-1), &[0]);
    }

    #[test]
    fn test_propagator_skips_disabled() {
        let mut rules = RuleSet::new();
        let id = rules.add(Rule::new(vec![-1, 2], RuleType::PackageRequires));
        let mut graph = WatchGraph::from_rules(&rules);
        rules.disable(id);

        let mut propagator = Propagator::new(&mut graph, &rules);
        let results = propagator.propagate(1, |lit| match lit {
            -1 => Some(false),
            2 => Some(false),
            _ => None,
        });

        assert!(results.is_empty());
    }
}
