use std::collections::HashMap;

use indexmap::IndexMap;

use super::rule::{Rule, RuleType};

/// Collection of SAT rules organized by type.
///
/// The RuleSet manages rules with:
/// - Deduplication of package rules based on rule type and literal content
/// - Sequential ID assignment in generation order
/// - Removal of learned rules on restart
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    /// All rules indexed by ID
    rules: Vec<Rule>,

    /// Rule ids by type, in insertion order
    rules_by_type: IndexMap<RuleType, Vec<u32>>,

    /// Dedup hash -> first rule with it
    rule_hashes: HashMap<u64, u32>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule to the set, returning its ID.
    /// A package rule with the same type and literals as an existing one
    /// returns the existing rule's ID.
    pub fn add(&mut self, mut rule: Rule) -> u32 {
        let dedup = rule.rule_type().is_package_rule();
        let hash = rule.dedup_hash();

        if dedup {
            if let Some(&existing_id) = self.rule_hashes.get(&hash) {
                if let Some(existing) = self.get(existing_id) {
                    if existing.is_duplicate_of(&rule) {
                        return existing_id;
                    }
                }
            }
        }

        let id = self.rules.len() as u32;
        rule.set_id(id);

        self.rules_by_type
            .entry(rule.rule_type())
            .or_default()
            .push(id);

        if dedup {
            self.rule_hashes.entry(hash).or_insert(id);
        }

        self.rules.push(rule);
        id
    }

    pub fn get(&self, id: u32) -> Option<&Rule> {
        self.rules.get(id as usize)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Rule> {
        self.rules.get_mut(id as usize)
    }

    /// Get all rules of a specific type in id order
    pub fn rules_of_type(&self, rule_type: RuleType) -> impl Iterator<Item = &Rule> {
        self.rules_by_type
            .get(&rule_type)
            .into_iter()
            .flatten()
            .filter_map(move |&id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn count_by_type(&self, rule_type: RuleType) -> usize {
        self.rules_by_type
            .get(&rule_type)
            .map(|v| v.len())
            .unwrap_or(0)
    }

    pub fn disable(&mut self, id: u32) {
        if let Some(rule) = self.get_mut(id) {
            rule.disable();
        }
    }

    pub fn enable(&mut self, id: u32) {
        if let Some(rule) = self.get_mut(id) {
            rule.enable();
        }
    }

    /// Drop every rule with an id of `first` or higher.
    /// Learned rules are always appended last, so this removes them.
    pub fn truncate(&mut self, first: u32) {
        if first as usize >= self.rules.len() {
            return;
        }
        self.rules.truncate(first as usize);
        for ids in self.rules_by_type.values_mut() {
            ids.retain(|&id| id < first);
        }
        self.rules_by_type.retain(|_, ids| !ids.is_empty());
        self.rule_hashes.retain(|_, id| *id < first);
    }

    pub fn stats(&self) -> RuleSetStats {
        let mut stats = RuleSetStats {
            total: self.rules.len(),
            ..Default::default()
        };

        for rule in &self.rules {
            match rule.rule_type() {
                RuleType::NotInstallable => stats.not_installable += 1,
                RuleType::NothingProvidesDep => stats.nothing_provides += 1,
                RuleType::PackageRequires => stats.requires += 1,
                RuleType::PackageSameName => stats.same_name += 1,
                RuleType::PackageConflict => stats.conflict += 1,
                RuleType::PackageObsoletes | RuleType::InstalledObsoletes => stats.obsoletes += 1,
                RuleType::Update => stats.update += 1,
                RuleType::Job => stats.job += 1,
                RuleType::Learned => stats.learned += 1,
            }

            if rule.is_assertion() {
                stats.assertions += 1;
            }
        }

        stats
    }
}

/// Statistics about a rule set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleSetStats {
    pub total: usize,
    pub assertions: usize,
    pub not_installable: usize,
    pub nothing_provides: usize,
    pub requires: usize,
    pub same_name: usize,
    pub conflict: usize,
    pub obsoletes: usize,
    pub update: usize,
    pub job: usize,
    pub learned: usize,
}
