use std::fmt;
use std::sync::Arc;

use crate::dependency::{Dependency, SpecGroup};

/// The most recent unsatisfiable demand recorded against a library
#[derive(Clone, Debug)]
pub struct Conflict {
    pub name: String,
    /// The activation the requirement clashed with, `None` if no acceptable version was found
    pub existing: Option<Arc<SpecGroup>>,
    pub requirement: Arc<Dependency>,
}

/// Conflicts keyed by library name, ordered from least to most recently recorded.
///
/// Entries are never rolled back when the search abandons a branch; a new conflict for the same
/// name replaces the previous one.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConflictMap {
    entries: Vec<Conflict>,
}

impl ConflictMap {
    pub(crate) fn record(&mut self, conflict: Conflict) {
        self.entries.retain(|c| c.name != conflict.name);
        self.entries.push(conflict);
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|c| c.name == name)
    }

    pub(crate) fn iter_recent_first(&self) -> impl Iterator<Item = &Conflict> + '_ {
        self.entries.iter().rev()
    }

    pub(crate) fn report(&self, group: &str) -> ConflictReport {
        ConflictReport {
            group: group.to_string(),
            conflicts: self.entries.clone(),
        }
    }
}

/// Every conflict recorded while resolving a group that could not be resolved
#[derive(Clone, Debug)]
pub struct ConflictReport {
    group: String,
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn conflict(&self, name: &str) -> Option<&Conflict> {
        self.conflicts.iter().find(|c| c.name == name)
    }

    /// The names of the libraries that could not be resolved
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.conflicts.iter().map(|c| c.name.as_str())
    }
}

fn describe(dependency: &Dependency) -> String {
    if dependency.is_root() {
        format!("`{dependency}`")
    } else {
        format!(
            "`{dependency}`, required by `{}`",
            dependency.requirer_chain()
        )
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to satisfy the requirements of group `{}`:",
            self.group
        )?;

        for conflict in &self.conflicts {
            match &conflict.existing {
                Some(existing) => {
                    write!(
                        f,
                        "\n|-- Could not find compatible versions for `{}`:",
                        conflict.name
                    )?;
                    match existing.required_by.last() {
                        Some(activated_for) => write!(
                            f,
                            "\n    |-- {}, activated {existing}",
                            describe(activated_for)
                        )?,
                        None => write!(f, "\n    |-- `{existing}` is already activated")?,
                    }
                    write!(f, "\n    |-- {}", describe(&conflict.requirement))?;
                }
                None => write!(f, "\n|-- Could not find {}", describe(&conflict.requirement))?,
            }
        }

        Ok(())
    }
}
