use std::path::Path;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::identity;
use crate::import_id;
use crate::planner::{Action, Change, Plan};
use crate::resource::BackupDefinitionResource;
use crate::state::{self, StateDoc};
use crate::store::RemoteStore;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub replaced: usize,
    pub deleted: usize,
}

impl ApplyReport {
    fn record(&mut self, action: Action) {
        let slot = match action {
            Action::Create => &mut self.created,
            Action::Update => &mut self.updated,
            Action::Replace => &mut self.replaced,
            Action::Delete => &mut self.deleted,
        };
        *slot = slot.saturating_add(1);
    }
}

fn apply_one<S: RemoteStore>(
    resource: &BackupDefinitionResource<S>,
    change: &Change,
    state: &mut StateDoc,
    state_path: &Path,
) -> Result<()> {
    match change {
        Change::Create { name, planned } => {
            let record = resource.create(planned.clone())?;
            state.put(name, record);
        }
        Change::Update { name, planned, .. } => {
            let record = resource.update(planned.clone())?;
            state.put(name, record);
        }
        Change::Replace {
            name,
            prior,
            planned,
            disable_prior,
        } => {
            if *disable_prior {
                let disabled = resource.delete(prior.clone())?;
                state.put(name, disabled);
                state::save(state_path, state)?;
            }
            let record = resource.create(planned.clone())?;
            state.put(name, record);
        }
        Change::Delete {
            name,
            prior,
            disable,
        } => {
            if *disable {
                resource.delete(prior.clone())?;
            }
            state.remove(name);
        }
    }
    state::save(state_path, state)
}

/// Executes `plan` in order. State is persisted after every change so a
/// failure leaves it describing exactly what was applied; the failing change
/// aborts the run.
pub fn apply<S: RemoteStore>(
    resource: &BackupDefinitionResource<S>,
    plan: &Plan,
    state: &mut StateDoc,
    state_path: &Path,
) -> Result<ApplyReport> {
    let mut report = ApplyReport::default();
    for change in plan.ordered() {
        let started = Instant::now();
        tracing::info!(name = change.name(), action = %change.action(), "applying change");
        apply_one(resource, change, state, state_path).map_err(|e| {
            tracing::error!(name = change.name(), action = %change.action(), error = %e, "change failed");
            e
        })?;
        tracing::info!(
            name = change.name(),
            action = %change.action(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "change applied"
        );
        report.record(change.action());
    }
    Ok(report)
}

/// Re-reads remote settings for every state entry. Nothing is written unless
/// every read succeeds.
pub fn refresh<S: RemoteStore>(
    resource: &BackupDefinitionResource<S>,
    state: &mut StateDoc,
    state_path: &Path,
) -> Result<usize> {
    let mut refreshed = Vec::with_capacity(state.resources.len());
    for (name, entry) in &state.resources {
        let record = resource
            .read(entry.record.clone())
            .map_err(|e| Error::msg(format!("refresh of '{name}' failed: {e}")))?;
        if record != entry.record {
            tracing::info!(name = name.as_str(), "remote settings drifted");
        }
        refreshed.push((name.clone(), record));
    }
    let count = refreshed.len();
    for (name, record) in refreshed {
        state.put(&name, record);
    }
    state::save(state_path, state)?;
    Ok(count)
}

pub fn import<S: RemoteStore>(
    resource: &BackupDefinitionResource<S>,
    state: &mut StateDoc,
    state_path: &Path,
    name: &str,
    id: &str,
) -> Result<()> {
    if state.record(name).is_some() {
        return Err(Error::msg(format!(
            "definition '{name}' is already managed; remove it from state before importing"
        )));
    }
    let key = identity::resolve_key(&import_id::parse(id)?)?;
    for (other, entry) in &state.resources {
        if identity::resolve_key(&entry.record).is_ok_and(|k| k == key) {
            return Err(Error::msg(format!(
                "{key} is already managed as '{other}'; remove it from state before importing"
            )));
        }
    }
    let record = resource.import(id)?;
    tracing::info!(name, id, enabled = record.settings.enabled, "imported backup definition");
    state.put(name, record);
    state::save(state_path, state)
}

/// Soft-deletes `only` (or every entry) and drops it from state.
pub fn destroy<S: RemoteStore>(
    resource: &BackupDefinitionResource<S>,
    state: &mut StateDoc,
    state_path: &Path,
    only: Option<&str>,
) -> Result<usize> {
    let names: Vec<String> = match only {
        Some(name) => {
            if state.record(name).is_none() {
                return Err(Error::msg(format!("definition '{name}' is not in state")));
            }
            vec![name.to_string()]
        }
        None => state.resources.keys().cloned().collect(),
    };
    for name in &names {
        let Some(prior) = state.record(name).cloned() else {
            continue;
        };
        resource.delete(prior)?;
        state.remove(name);
        state::save(state_path, state)?;
        tracing::info!(name = name.as_str(), "disabled backup definition");
    }
    Ok(names.len())
}
