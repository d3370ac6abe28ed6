use indexmap::IndexMap;

use super::interner::Id;
use super::solvable::{Solvable, SolvableId};

/// Index from a name to every solvable that carries it as its own name or
/// provides it. Lists are sorted by solvable id and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhatProvides {
    index: IndexMap<Id, Vec<SolvableId>>,
}

impl WhatProvides {
    pub fn build(solvables: &[Solvable]) -> Self {
        let mut index: IndexMap<Id, Vec<SolvableId>> = IndexMap::new();

        for (i, solvable) in solvables.iter().enumerate() {
            let id = SolvableId::from_index(i);
            index.entry(solvable.name).or_default().push(id);
            for provide in &solvable.deps.provides {
                let list = index.entry(provide.name).or_default();
                if list.last() != Some(&id) {
                    list.push(id);
                }
            }
        }

        index.sort_keys();
        Self { index }
    }

    pub fn get(&self, name: Id) -> &[SolvableId] {
        self.index.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
