use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::BackupDefinition;

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StateEntry {
    pub record: BackupDefinition,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StateDoc {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, StateEntry>,
}

impl Default for StateDoc {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateDoc {
    pub fn record(&self, name: &str) -> Option<&BackupDefinition> {
        self.resources.get(name).map(|e| &e.record)
    }

    pub fn put(&mut self, name: &str, record: BackupDefinition) {
        self.resources.insert(
            name.to_string(),
            StateEntry {
                record,
                updated_at: chrono::Utc::now().to_rfc3339(),
            },
        );
    }

    pub fn remove(&mut self, name: &str) -> Option<BackupDefinition> {
        self.resources.remove(name).map(|e| e.record)
    }
}

pub fn load(path: &Path) -> Result<StateDoc> {
    if !path.is_file() {
        return Ok(StateDoc::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| Error::msg(format!("failed to read state {}: {e}", path.display())))?;
    let doc = serde_json::from_str::<StateDoc>(&raw)
        .map_err(|e| Error::msg(format!("failed to parse state {}: {e}", path.display())))?;
    if doc.version != STATE_VERSION {
        return Err(Error::msg(format!(
            "unsupported state version {} in {} (expected {STATE_VERSION})",
            doc.version,
            path.display()
        )));
    }
    Ok(doc)
}

fn atomic_write_text(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| Error::msg(format!("failed to create {}: {e}", parent.display())))?;
    }
    let file_name = path.file_name().and_then(|s| s.to_str()).ok_or_else(|| {
        Error::msg(format!(
            "invalid file path for atomic write: {}",
            path.display()
        ))
    })?;
    let tmp = path.with_file_name(format!(
        ".{}.tmp.{}.{}",
        file_name,
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    fs::write(&tmp, body)
        .map_err(|e| Error::msg(format!("failed to write temp file {}: {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        Error::msg(format!(
            "failed to rename {} -> {}: {e}",
            tmp.display(),
            path.display()
        ))
    })
}

pub fn save(path: &Path, doc: &StateDoc) -> Result<()> {
    let body = serde_json::to_string_pretty(doc)
        .map_err(|e| Error::msg(format!("failed to encode state: {e}")))?;
    atomic_write_text(path, &body)
}
