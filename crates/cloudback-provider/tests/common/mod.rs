#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use cloudback_provider::error::{RemoteError, Result};
use cloudback_provider::model::{BackupDefinition, DefinitionKey, Settings, Subject};
use cloudback_provider::store::RemoteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(DefinitionKey),
    Upsert(DefinitionKey, Settings),
}

/// Remote store double that echoes back whatever was upserted.
#[derive(Default)]
pub struct InMemoryStore {
    definitions: Mutex<BTreeMap<DefinitionKey, Settings>>,
    calls: Mutex<Vec<Call>>,
    fail_with: Mutex<Option<RemoteError>>,
}

impl InMemoryStore {
    pub fn seeded(key: DefinitionKey, settings: Settings) -> Self {
        let store = Self::default();
        store.definitions.lock().unwrap().insert(key, settings);
        store
    }

    pub fn fail_all_calls(&self, err: RemoteError) {
        *self.fail_with.lock().unwrap() = Some(err);
    }

    pub fn get(&self, key: &DefinitionKey) -> Option<Settings> {
        self.definitions.lock().unwrap().get(key).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<DefinitionKey, Settings> {
        self.definitions.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        match self.fail_with.lock().unwrap().clone() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl RemoteStore for InMemoryStore {
    fn fetch_definition(&self, key: &DefinitionKey) -> Result<Settings> {
        self.calls.lock().unwrap().push(Call::Fetch(key.clone()));
        self.check_failure()?;
        self.get(key).ok_or_else(|| {
            RemoteError::Status {
                status_code: 404,
                status: "404 Not Found".into(),
                body: String::new(),
            }
            .into()
        })
    }

    fn upsert_definition(&self, key: &DefinitionKey, settings: &Settings) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Upsert(key.clone(), settings.clone()));
        self.check_failure()?;
        self.definitions
            .lock()
            .unwrap()
            .insert(key.clone(), settings.clone());
        Ok(())
    }
}

pub fn settings(enabled: bool) -> Settings {
    Settings {
        enabled,
        schedule: "Daily at 9 pm".into(),
        storage: "Cloudback EU".into(),
        retention: "Last 30 days".into(),
    }
}

pub fn legacy_docs() -> BackupDefinition {
    BackupDefinition {
        platform: "GitHub".into(),
        account: "testland".into(),
        repository: Some("docs".into()),
        settings: settings(true),
        ..Default::default()
    }
}

pub fn subject_record(subject_type: &str, subject_name: &str) -> BackupDefinition {
    BackupDefinition {
        platform: "GitHub".into(),
        account: "testland".into(),
        subject_type: Some(subject_type.into()),
        subject_name: Some(subject_name.into()),
        settings: settings(true),
        ..Default::default()
    }
}

pub fn key(subject_type: &str, subject_name: &str) -> DefinitionKey {
    DefinitionKey {
        platform: "GitHub".into(),
        account: "testland".into(),
        subject: Subject {
            subject_type: subject_type.into(),
            subject_name: subject_name.into(),
        },
    }
}
