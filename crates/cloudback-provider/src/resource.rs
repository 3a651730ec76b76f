//! Lifecycle of a single backup definition.
//!
//! Every operation resolves the record's identity first and issues at most one
//! remote call. Create, update and delete are unconditional upserts; delete
//! only disables the definition on the remote side.

use crate::error::Result;
use crate::identity;
use crate::import_id;
use crate::model::{BackupDefinition, DefinitionKey, Settings};
use crate::store::RemoteStore;

pub struct BackupDefinitionResource<S> {
    store: S,
}

impl<S: RemoteStore> BackupDefinitionResource<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upserts the declared settings and hands the declared record back.
    pub fn create(&self, planned: BackupDefinition) -> Result<BackupDefinition> {
        self.apply(planned)
    }

    /// Replaces the settings of a persisted record with the remote ones.
    /// Identity fields are kept as persisted.
    pub fn read(&self, mut prior: BackupDefinition) -> Result<BackupDefinition> {
        let key = identity::resolve_key(&prior)?;
        prior.settings = self.store.fetch_definition(&key)?;
        tracing::debug!(definition = %key, enabled = prior.settings.enabled, "read backup definition");
        Ok(prior)
    }

    pub fn update(&self, planned: BackupDefinition) -> Result<BackupDefinition> {
        self.apply(planned)
    }

    /// Disables the definition remotely. The returned record carries the
    /// settings that were submitted.
    pub fn delete(&self, prior: BackupDefinition) -> Result<BackupDefinition> {
        let key = identity::resolve_key(&prior)?;
        let disabled = Settings::disabled();
        self.store.upsert_definition(&key, &disabled)?;
        let record = BackupDefinition {
            settings: disabled,
            ..prior
        };
        log_updated(&key, &record);
        Ok(record)
    }

    /// Builds a record from an import identifier and the remote settings.
    pub fn import(&self, id: &str) -> Result<BackupDefinition> {
        let parsed = import_id::parse(id)?;
        self.read(parsed)
    }

    fn apply(&self, planned: BackupDefinition) -> Result<BackupDefinition> {
        let key = identity::resolve_key(&planned)?;
        self.store.upsert_definition(&key, &planned.settings)?;
        log_updated(&key, &planned);
        Ok(planned)
    }
}

fn log_updated(key: &DefinitionKey, record: &BackupDefinition) {
    tracing::trace!(
        platform = %record.platform,
        account = %record.account,
        subject_type = record.subject_type.as_deref(),
        subject_name = record.subject_name.as_deref(),
        repository = record.repository.as_deref(),
        resolved = %key,
        legacy_identity = identity::SubjectRef::of(record).is_ok_and(|r| r.is_legacy()),
        enabled = record.settings.enabled,
        schedule = %record.settings.schedule,
        storage = %record.settings.storage,
        retention = %record.settings.retention,
        "updated backup definition"
    );
}
