use std::fmt;

use crate::pool::{Id, Pool, Relation, SolvableId};

/// What a job asks the solver to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobCommand {
    /// Install this exact solvable
    InstallSolvable(SolvableId),
    /// Install the best solvable with this name
    InstallName(Id),
    /// Install the best solvable satisfying the relation
    InstallRelation(Relation),
    /// Install one of the listed solvables
    InstallOneOf(Vec<SolvableId>),
    EraseSolvable(SolvableId),
    /// Erase every solvable with this name
    EraseName(Id),
    /// Erase every solvable satisfying the relation
    EraseRelation(Relation),
    /// Update an installed solvable to its best candidate
    UpdateSolvable(SolvableId),
    /// Update every installed solvable with this name
    UpdateName(Id),
    /// Update every installed solvable
    UpdateSystem,
    /// Move installed solvables of this name to the best available version,
    /// downgrading or changing architecture if needed. Installs the name
    /// when nothing of it is installed.
    DistUpgradeName(Id),
    /// Distribution upgrade of every installed solvable
    DistUpgradeSystem,
    /// Keep the solvable in its current state
    Lock(SolvableId),
}

impl JobCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCommand::InstallSolvable(_) => "install-solvable",
            JobCommand::InstallName(_) => "install-name",
            JobCommand::InstallRelation(_) => "install-relation",
            JobCommand::InstallOneOf(_) => "install-one-of",
            JobCommand::EraseSolvable(_) => "erase-solvable",
            JobCommand::EraseName(_) => "erase-name",
            JobCommand::EraseRelation(_) => "erase-relation",
            JobCommand::UpdateSolvable(_) => "update-solvable",
            JobCommand::UpdateName(_) => "update-name",
            JobCommand::UpdateSystem => "update-system",
            JobCommand::DistUpgradeName(_) => "distupgrade-name",
            JobCommand::DistUpgradeSystem => "distupgrade-system",
            JobCommand::Lock(_) => "lock",
        }
    }

    pub fn is_install(&self) -> bool {
        matches!(
            self,
            JobCommand::InstallSolvable(_)
                | JobCommand::InstallName(_)
                | JobCommand::InstallRelation(_)
                | JobCommand::InstallOneOf(_)
        )
    }

    pub fn is_erase(&self) -> bool {
        matches!(
            self,
            JobCommand::EraseSolvable(_) | JobCommand::EraseName(_) | JobCommand::EraseRelation(_)
        )
    }

    pub fn is_dist_upgrade(&self) -> bool {
        matches!(self, JobCommand::DistUpgradeName(_) | JobCommand::DistUpgradeSystem)
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a job queue.
///
/// A weak job may be dropped by the solver when it cannot be fulfilled; it is
/// then reported through `Solver::ignored_jobs()` instead of as a problem.
///
/// An erase job with `clean_deps` also removes installed solvables that were
/// only needed by the erased ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub command: JobCommand,
    pub weak: bool,
    pub clean_deps: bool,
}

impl Job {
    pub fn new(command: JobCommand) -> Self {
        Self {
            command,
            weak: false,
            clean_deps: false,
        }
    }

    pub fn weak(command: JobCommand) -> Self {
        Self {
            weak: true,
            ..Self::new(command)
        }
    }

    pub fn with_clean_deps(mut self) -> Self {
        self.clean_deps = true;
        self
    }

    /// Human-readable form, e.g. `install-name G`
    pub fn describe(&self, pool: &Pool) -> String {
        let target = match &self.command {
            JobCommand::InstallSolvable(id)
            | JobCommand::EraseSolvable(id)
            | JobCommand::UpdateSolvable(id)
            | JobCommand::Lock(id) => pool.solvable_str(*id),
            JobCommand::InstallName(name)
            | JobCommand::EraseName(name)
            | JobCommand::UpdateName(name)
            | JobCommand::DistUpgradeName(name) => pool.id_str(*name).to_string(),
            JobCommand::InstallRelation(rel) | JobCommand::EraseRelation(rel) => pool.relation_str(rel),
            JobCommand::InstallOneOf(ids) => ids
                .iter()
                .map(|&id| pool.solvable_str(id))
                .collect::<Vec<_>>()
                .join(" | "),
            JobCommand::UpdateSystem | JobCommand::DistUpgradeSystem => String::new(),
        };

        let mut text = self.command.to_string();
        if !target.is_empty() {
            text.push(' ');
            text.push_str(&target);
        }
        if self.clean_deps {
            text.push_str(" (cleandeps)");
        }
        if self.weak {
            text.push_str(" (weak)");
        }
        text
    }
}

/// An ordered list of jobs.
///
/// The solver only reads the queue; a job's position is its index in
/// problems and decision reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobQueue {
    jobs: Vec<Job>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, job: Job) -> &mut Self {
        self.jobs.push(job);
        self
    }

    pub fn install(&mut self, id: SolvableId) -> &mut Self {
        self.push(Job::new(JobCommand::InstallSolvable(id)))
    }

    pub fn install_name(&mut self, name: Id) -> &mut Self {
        self.push(Job::new(JobCommand::InstallName(name)))
    }

    pub fn install_relation(&mut self, relation: Relation) -> &mut Self {
        self.push(Job::new(JobCommand::InstallRelation(relation)))
    }

    pub fn install_one_of(&mut self, ids: Vec<SolvableId>) -> &mut Self {
        self.push(Job::new(JobCommand::InstallOneOf(ids)))
    }

    pub fn erase(&mut self, id: SolvableId) -> &mut Self {
        self.push(Job::new(JobCommand::EraseSolvable(id)))
    }

    pub fn erase_name(&mut self, name: Id) -> &mut Self {
        self.push(Job::new(JobCommand::EraseName(name)))
    }

    pub fn erase_relation(&mut self, relation: Relation) -> &mut Self {
        self.push(Job::new(JobCommand::EraseRelation(relation)))
    }

    /// Erase a solvable together with dependencies nothing else needs
    pub fn erase_clean_deps(&mut self, id: SolvableId) -> &mut Self {
        self.push(Job::new(JobCommand::EraseSolvable(id)).with_clean_deps())
    }

    pub fn erase_name_clean_deps(&mut self, name: Id) -> &mut Self {
        self.push(Job::new(JobCommand::EraseName(name)).with_clean_deps())
    }

    pub fn update(&mut self, id: SolvableId) -> &mut Self {
        self.push(Job::new(JobCommand::UpdateSolvable(id)))
    }

    pub fn update_name(&mut self, name: Id) -> &mut Self {
        self.push(Job::new(JobCommand::UpdateName(name)))
    }

    pub fn update_system(&mut self) -> &mut Self {
        self.push(Job::new(JobCommand::UpdateSystem))
    }

    pub fn dist_upgrade_name(&mut self, name: Id) -> &mut Self {
        self.push(Job::new(JobCommand::DistUpgradeName(name)))
    }

    pub fn dist_upgrade_system(&mut self) -> &mut Self {
        self.push(Job::new(JobCommand::DistUpgradeSystem))
    }

    pub fn lock(&mut self, id: SolvableId) -> &mut Self {
        self.push(Job::new(JobCommand::Lock(id)))
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl FromIterator<Job> for JobQueue {
    fn from_iter<T: IntoIterator<Item = Job>>(iter: T) -> Self {
        Self {
            jobs: iter.into_iter().collect(),
        }
    }
}
