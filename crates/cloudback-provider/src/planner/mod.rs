use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{Error, Result};
use crate::identity;
use crate::model::{BackupDefinition, DefinitionKey};
use crate::state::StateDoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    Delete,
    Replace,
    Create,
    Update,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Delete => "delete",
            Self::Replace => "replace",
            Self::Create => "create",
            Self::Update => "update",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Create {
        name: String,
        planned: BackupDefinition,
    },
    Update {
        name: String,
        prior: BackupDefinition,
        planned: BackupDefinition,
    },
    /// The resolved key moved. `disable_prior` is false when another declared
    /// definition takes over the prior key.
    Replace {
        name: String,
        prior: BackupDefinition,
        planned: BackupDefinition,
        disable_prior: bool,
    },
    Delete {
        name: String,
        prior: BackupDefinition,
        disable: bool,
    },
}

impl Change {
    pub fn name(&self) -> &str {
        match self {
            Self::Create { name, .. }
            | Self::Update { name, .. }
            | Self::Replace { name, .. }
            | Self::Delete { name, .. } => name,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::Create { .. } => Action::Create,
            Self::Update { .. } => Action::Update,
            Self::Replace { .. } => Action::Replace,
            Self::Delete { .. } => Action::Delete,
        }
    }
}

#[derive(Debug, Default)]
pub struct Plan {
    changes: Vec<Change>,
}

impl Plan {
    pub fn add(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Changes in execution order: disabling deletes, replaces, creates,
    /// updates, then deletes whose key another definition takes over. Each
    /// group is sorted by name.
    ///
    /// A handed-over key stays in state under its old name until the change
    /// that claims it has been applied.
    pub fn ordered(&self) -> Vec<&Change> {
        let mut out: Vec<&Change> = self.changes.iter().collect();
        out.sort_by(|a, b| (rank(a), a.name()).cmp(&(rank(b), b.name())));
        out
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn count(&self, action: Action) -> usize {
        self.changes.iter().filter(|c| c.action() == action).count()
    }

    pub fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        for change in self.ordered() {
            let line = match change {
                Change::Create { name, planned } => {
                    format!("+ {name}: {}", identity::resolve_key(planned)?)
                }
                Change::Update { name, planned, .. } => {
                    format!("~ {name}: {}", identity::resolve_key(planned)?)
                }
                Change::Replace {
                    name,
                    prior,
                    planned,
                    ..
                } => format!(
                    "-/+ {name}: {} -> {}",
                    identity::resolve_key(prior)?,
                    identity::resolve_key(planned)?
                ),
                Change::Delete { name, prior, .. } => {
                    format!("- {name}: {}", identity::resolve_key(prior)?)
                }
            };
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!(
            "{} to create, {} to update, {} to replace, {} to delete\n",
            self.count(Action::Create),
            self.count(Action::Update),
            self.count(Action::Replace),
            self.count(Action::Delete)
        ));
        Ok(out)
    }
}

fn rank(change: &Change) -> u8 {
    match change {
        Change::Delete { disable: true, .. } => 0,
        Change::Replace { .. } => 1,
        Change::Create { .. } => 2,
        Change::Update { .. } => 3,
        Change::Delete { disable: false, .. } => 4,
    }
}

fn resolve_declared(
    declared: &BTreeMap<String, BackupDefinition>,
) -> Result<BTreeMap<&str, DefinitionKey>> {
    let mut keys = BTreeMap::new();
    let mut owners: BTreeMap<DefinitionKey, &str> = BTreeMap::new();
    for (name, record) in declared {
        let key = identity::resolve_key(record)
            .map_err(|e| Error::msg(format!("definition '{name}': {e}")))?;
        if let Some(other) = owners.insert(key.clone(), name.as_str()) {
            return Err(Error::msg(format!(
                "definitions '{other}' and '{name}' both address {key}"
            )));
        }
        keys.insert(name.as_str(), key);
    }
    Ok(keys)
}

/// Diffs declared definitions against state. Records are compared by
/// resolved key, so moving between the legacy and generalized identity form
/// for the same subject is an update, not a replace.
pub fn plan(declared: &BTreeMap<String, BackupDefinition>, state: &StateDoc) -> Result<Plan> {
    let declared_keys = resolve_declared(declared)?;
    let claimed: BTreeSet<&DefinitionKey> = declared_keys.values().collect();

    let mut plan = Plan::default();
    for (name, planned) in declared {
        let Some(prior) = state.record(name) else {
            plan.add(Change::Create {
                name: name.clone(),
                planned: planned.clone(),
            });
            continue;
        };
        if prior == planned {
            continue;
        }
        let prior_key = identity::resolve_key(prior)
            .map_err(|e| Error::msg(format!("state entry '{name}': {e}")))?;
        if prior_key == declared_keys[name.as_str()] {
            plan.add(Change::Update {
                name: name.clone(),
                prior: prior.clone(),
                planned: planned.clone(),
            });
        } else {
            plan.add(Change::Replace {
                name: name.clone(),
                prior: prior.clone(),
                planned: planned.clone(),
                disable_prior: !claimed.contains(&prior_key),
            });
        }
    }

    for (name, entry) in &state.resources {
        if declared.contains_key(name) {
            continue;
        }
        let prior_key = identity::resolve_key(&entry.record)
            .map_err(|e| Error::msg(format!("state entry '{name}': {e}")))?;
        plan.add(Change::Delete {
            name: name.clone(),
            prior: entry.record.clone(),
            disable: !claimed.contains(&prior_key),
        });
    }

    Ok(plan)
}
