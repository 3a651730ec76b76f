use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use toml::Value;

use crate::client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::error::{Error, Result};
use crate::model::BackupDefinition;

pub const API_KEY_ENV: &str = "CLOUDBACK_API_KEY";
pub const ENDPOINT_ENV: &str = "CLOUDBACK_ENDPOINT";

#[derive(Debug, Clone)]
pub struct ConfigDoc {
    pub value: Value,
}

impl ConfigDoc {
    pub fn value_path(&self, path: &str) -> Option<&Value> {
        let path = path.trim();
        if path.is_empty() {
            return Some(&self.value);
        }
        let mut cur = &self.value;
        for seg in path.split('.') {
            cur = cur.as_table()?.get(seg)?;
        }
        Some(cur)
    }

    pub fn deserialize_path<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let Some(v) = self.value_path(path) else {
            return Ok(None);
        };
        let parsed = v
            .clone()
            .try_into()
            .map_err(|e| Error::msg(format!("failed to deserialize config at '{}': {e}", path)))?;
        Ok(Some(parsed))
    }

    pub fn provider(&self) -> Result<ProviderConfig> {
        Ok(self.deserialize_path("provider")?.unwrap_or_default())
    }

    /// Declared definitions keyed by their local name.
    pub fn definitions(&self) -> Result<BTreeMap<String, BackupDefinition>> {
        Ok(self.deserialize_path("definitions")?.unwrap_or_default())
    }
}

/// `[provider]` block. Empty values fall back to the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: String,
    pub endpoint: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

impl ProviderConfig {
    pub fn resolve(&self) -> Result<ProviderSettings> {
        self.resolve_with(|k| std::env::var(k).ok())
    }

    /// Config values take precedence over environment values.
    pub fn resolve_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<ProviderSettings> {
        let api_key = non_empty(self.api_key.as_deref())
            .or_else(|| non_empty(env(API_KEY_ENV).as_deref()))
            .ok_or_else(|| {
                Error::msg(format!(
                    "missing API key: set provider.api_key or the {API_KEY_ENV} environment variable"
                ))
            })?;
        let endpoint = non_empty(self.endpoint.as_deref())
            .or_else(|| non_empty(env(ENDPOINT_ENV).as_deref()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout_secs = match self.timeout_secs {
            Some(0) => return Err(Error::msg("provider.timeout_secs must be greater than 0")),
            Some(n) => n,
            None => DEFAULT_TIMEOUT_SECS,
        };
        Ok(ProviderSettings {
            api_key,
            endpoint,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn merge_values(base: &mut Value, child: Value) {
    match (base, child) {
        (Value::Table(base_tbl), Value::Table(child_tbl)) => {
            for (k, v) in child_tbl {
                match base_tbl.get_mut(&k) {
                    Some(existing) => merge_values(existing, v),
                    None => {
                        base_tbl.insert(k, v);
                    }
                }
            }
        }
        (base_slot, child_val) => {
            *base_slot = child_val;
        }
    }
}

fn resolve_ref_path(from_file: &Path, reference: &str) -> PathBuf {
    let p = PathBuf::from(reference);
    if p.is_absolute() {
        p
    } else {
        from_file.parent().unwrap_or_else(|| Path::new(".")).join(p)
    }
}

fn load_value_inner(path: &Path, stack: &mut HashSet<PathBuf>) -> Result<Value> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !stack.insert(canonical.clone()) {
        return Err(Error::msg(format!(
            "config extends cycle detected at {}",
            canonical.display()
        )));
    }

    let data = fs::read_to_string(path)
        .map_err(|e| Error::msg(format!("failed to read config {}: {e}", path.display())))?;
    let mut value: Value = toml::from_str(&data)
        .map_err(|e| Error::msg(format!("TOML parse error in {}: {e}", path.display())))?;

    let mut out = Value::Table(Default::default());
    if let Some(parent) = value.get("extends").and_then(Value::as_str) {
        out = load_value_inner(&resolve_ref_path(path, parent), stack)?;
    }
    if let Some(tbl) = value.as_table_mut() {
        tbl.remove("extends");
    }
    merge_values(&mut out, value);

    stack.remove(&canonical);
    Ok(out)
}

pub fn load(path: &Path) -> Result<ConfigDoc> {
    let mut stack = HashSet::<PathBuf>::new();
    let value = load_value_inner(path, &mut stack)?;
    Ok(ConfigDoc { value })
}
