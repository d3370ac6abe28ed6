use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::pool::{Pool, SolvableId};

/// What happens to a solvable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionOp {
    /// Install a solvable that is not installed
    Install,
    /// Remove an installed solvable
    Remove,
    /// Install a solvable replacing an installed one of the same name (`related`)
    Update,
    /// An installed solvable is replaced by the obsoleting `related` solvable
    Obsolete,
}

impl DecisionOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOp::Install => "install",
            DecisionOp::Remove => "remove",
            DecisionOp::Update => "update",
            DecisionOp::Obsolete => "obsolete",
        }
    }
}

impl fmt::Display for DecisionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a decision was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    /// Requested by the job at this queue index
    Job(usize),
    Required { by: SolvableId },
    Recommended { by: SolvableId },
    Supplements { of: SolvableId },
    /// Best update candidate of an installed solvable
    Update { of: SolvableId },
    /// Kept from the installed system
    Installed,
    Conflict { with: SolvableId },
    Obsoleted { by: SolvableId },
    /// Only needed by solvables a cleandeps erase removes
    Unneeded,
    /// No single rule explains the decision
    Other,
}

impl DecisionReason {
    pub fn describe(&self, pool: &Pool) -> String {
        match self {
            DecisionReason::Job(index) => format!("job #{}", index),
            DecisionReason::Required { by } => format!("required by {}", pool.solvable_str(*by)),
            DecisionReason::Recommended { by } => format!("recommended by {}", pool.solvable_str(*by)),
            DecisionReason::Supplements { of } => format!("supplements {}", pool.solvable_str(*of)),
            DecisionReason::Update { of } => format!("update of {}", pool.solvable_str(*of)),
            DecisionReason::Installed => "installed".to_string(),
            DecisionReason::Conflict { with } => format!("conflicts with {}", pool.solvable_str(*with)),
            DecisionReason::Obsoleted { by } => format!("obsoleted by {}", pool.solvable_str(*by)),
            DecisionReason::Unneeded => "no longer needed".to_string(),
            DecisionReason::Other => "resolver choice".to_string(),
        }
    }
}

/// One step of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision {
    pub op: DecisionOp,
    pub solvable: SolvableId,
    /// The replaced solvable of an update, the replacement of an obsolete
    pub related: Option<SolvableId>,
    pub reason: DecisionReason,
}

impl Decision {
    pub fn describe(&self, pool: &Pool) -> String {
        let name = pool.solvable_str(self.solvable);
        let line = match (self.op, self.related) {
            (DecisionOp::Update, Some(from)) => format!("update {} -> {}", pool.solvable_str(from), name),
            (DecisionOp::Obsolete, Some(by)) => format!("obsolete {} by {}", name, pool.solvable_str(by)),
            (op, _) => format!("{} {}", op, name),
        };
        format!("{} ({})", line, self.reason.describe(pool))
    }
}

/// The ordered changes turning the installed system into the solution.
///
/// Removals come first, then installs and updates with dependencies before
/// their dependents. Each obsolete follows the install that causes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    decisions: Vec<Decision>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the transaction between the installed solvables and the
    /// solvables of the solution
    pub(crate) fn build<F>(
        pool: &Pool,
        installed: &[SolvableId],
        result: &BTreeSet<SolvableId>,
        reason_of: F,
    ) -> Self
    where
        F: Fn(SolvableId) -> DecisionReason,
    {
        let installed_set: BTreeSet<SolvableId> = installed.iter().copied().collect();
        let removed: Vec<SolvableId> = installed_set.iter().copied().filter(|id| !result.contains(id)).collect();
        let added: Vec<SolvableId> = result.iter().copied().filter(|id| !installed_set.contains(id)).collect();

        let name_of = |id: SolvableId| pool.solvable(id).map(|s| s.name);

        // new solvable -> (replaced solvable, op)
        let mut replaced: BTreeMap<SolvableId, Vec<(SolvableId, DecisionOp)>> = BTreeMap::new();
        let mut pure_removals = Vec::new();

        for &old in &removed {
            let same_name = added.iter().copied().find(|&new| name_of(new) == name_of(old));
            let obsoleter = added.iter().copied().find(|&new| {
                pool.solvable(new)
                    .map(|s| s.deps.obsoletes.iter().any(|rel| pool.matches_name_evr(old, rel)))
                    .unwrap_or(false)
            });

            match same_name.or(obsoleter) {
                Some(new) => {
                    let entries = replaced.entry(new).or_default();
                    let has_update = entries.iter().any(|&(_, op)| op == DecisionOp::Update);
                    let op = if same_name.is_some() && !has_update {
                        DecisionOp::Update
                    } else {
                        DecisionOp::Obsolete
                    };
                    entries.push((old, op));
                }
                None => pure_removals.push(old),
            }
        }

        let mut decisions = Vec::with_capacity(removed.len() + added.len());
        for old in pure_removals {
            decisions.push(Decision {
                op: DecisionOp::Remove,
                solvable: old,
                related: None,
                reason: reason_of(old),
            });
        }

        for new in install_order(pool, &added) {
            let entries = replaced.get(&new).map(Vec::as_slice).unwrap_or(&[]);
            let update_of = entries
                .iter()
                .find(|&&(_, op)| op == DecisionOp::Update)
                .map(|&(old, _)| old);

            decisions.push(Decision {
                op: if update_of.is_some() { DecisionOp::Update } else { DecisionOp::Install },
                solvable: new,
                related: update_of,
                reason: reason_of(new),
            });

            for &(old, op) in entries {
                if op == DecisionOp::Obsolete {
                    decisions.push(Decision {
                        op: DecisionOp::Obsolete,
                        solvable: old,
                        related: Some(new),
                        reason: DecisionReason::Obsoleted { by: new },
                    });
                }
            }
        }

        Self { decisions }
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Decision> {
        self.decisions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Newly installed solvables, excluding updates
    pub fn installs(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.with_op(DecisionOp::Install).map(|d| d.solvable)
    }

    pub fn removals(&self) -> impl Iterator<Item = SolvableId> + '_ {
        self.with_op(DecisionOp::Remove).map(|d| d.solvable)
    }

    /// `(from, to)` pairs
    pub fn updates(&self) -> impl Iterator<Item = (SolvableId, SolvableId)> + '_ {
        self.with_op(DecisionOp::Update)
            .filter_map(|d| d.related.map(|from| (from, d.solvable)))
    }

    /// `(obsoleted, by)` pairs
    pub fn obsoletes(&self) -> impl Iterator<Item = (SolvableId, SolvableId)> + '_ {
        self.with_op(DecisionOp::Obsolete)
            .filter_map(|d| d.related.map(|by| (d.solvable, by)))
    }

    fn with_op(&self, op: DecisionOp) -> impl Iterator<Item = &Decision> + '_ {
        self.decisions.iter().filter(move |d| d.op == op)
    }

    pub fn summary(&self) -> TransactionSummary {
        let mut summary = TransactionSummary::default();

        for decision in &self.decisions {
            match decision.op {
                DecisionOp::Install => summary.installs += 1,
                DecisionOp::Update => summary.updates += 1,
                DecisionOp::Remove => summary.removals += 1,
                DecisionOp::Obsolete => summary.obsoletes += 1,
            }
        }

        summary
    }

    /// One line per decision
    pub fn describe(&self, pool: &Pool) -> String {
        self.decisions
            .iter()
            .map(|d| d.describe(pool))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<'a> IntoIterator for &'a Transaction {
    type Item = &'a Decision;
    type IntoIter = std::slice::Iter<'a, Decision>;

    fn into_iter(self) -> Self::IntoIter {
        self.decisions.iter()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

/// Summary of a transaction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionSummary {
    pub installs: usize,
    pub updates: usize,
    pub removals: usize,
    pub obsoletes: usize,
}

impl fmt::Display for TransactionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if self.installs > 0 {
            parts.push(format!("{} install(s)", self.installs));
        }
        if self.updates > 0 {
            parts.push(format!("{} update(s)", self.updates));
        }
        if self.removals > 0 {
            parts.push(format!("{} removal(s)", self.removals));
        }
        if self.obsoletes > 0 {
            parts.push(format!("{} obsoleted", self.obsoletes));
        }

        if parts.is_empty() {
            write!(f, "Nothing to do")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Order new solvables so requirements come before their dependents.
/// Ties are broken by the lowest solvable id. A cycle is broken at the
/// lowest id of a cycle that waits on nothing outside itself.
fn install_order(pool: &Pool, added: &[SolvableId]) -> Vec<SolvableId> {
    let mut deps_of: BTreeMap<SolvableId, BTreeSet<SolvableId>> = BTreeMap::new();
    let mut dependents: BTreeMap<SolvableId, Vec<SolvableId>> = BTreeMap::new();

    for &id in added {
        let mut deps = BTreeSet::new();
        if let Some(solvable) = pool.solvable(id) {
            for rel in &solvable.deps.requires {
                for &other in added {
                    if other != id && pool.matches(other, rel) {
                        deps.insert(other);
                    }
                }
            }
        }
        for &dep in &deps {
            dependents.entry(dep).or_default().push(id);
        }
        deps_of.insert(id, deps);
    }

    // Kahn's algorithm with an ordered ready set
    let mut in_degree: BTreeMap<SolvableId, usize> =
        deps_of.iter().map(|(&id, deps)| (id, deps.len())).collect();
    let mut ready: BTreeSet<SolvableId> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();
    let mut order = Vec::with_capacity(added.len());

    while !in_degree.is_empty() {
        let next = match ready.pop_first() {
            Some(id) => id,
            None => match cycle_entry(&deps_of, &in_degree) {
                Some(id) => id,
                None => break,
            },
        };
        in_degree.remove(&next);
        order.push(next);

        for dependent in dependents.get(&next).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(dependent) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.insert(*dependent);
                }
            }
        }
    }

    order
}

/// Lowest pending id whose pending requirements all lead back to it
fn cycle_entry(
    deps_of: &BTreeMap<SolvableId, BTreeSet<SolvableId>>,
    pending: &BTreeMap<SolvableId, usize>,
) -> Option<SolvableId> {
    let reachable = |start: SolvableId| {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            for &dep in deps_of.get(&id).into_iter().flatten() {
                if pending.contains_key(&dep) && seen.insert(dep) {
                    stack.push(dep);
                }
            }
        }
        seen
    };

    pending
        .keys()
        .copied()
        .find(|&id| reachable(id).iter().all(|&dep| reachable(dep).contains(&id)))
        .or_else(|| pending.keys().next().copied())
}
