use std::sync::Arc;

use crate::error::Result;
use crate::model::{DefinitionKey, Settings};

/// The two remote operations the lifecycle is built on.
///
/// `upsert_definition` is an unconditional create-or-replace; callers never
/// check existence first.
pub trait RemoteStore {
    fn fetch_definition(&self, key: &DefinitionKey) -> Result<Settings>;
    fn upsert_definition(&self, key: &DefinitionKey, settings: &Settings) -> Result<()>;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &S {
    fn fetch_definition(&self, key: &DefinitionKey) -> Result<Settings> {
        (**self).fetch_definition(key)
    }

    fn upsert_definition(&self, key: &DefinitionKey, settings: &Settings) -> Result<()> {
        (**self).upsert_definition(key, settings)
    }
}

impl<S: RemoteStore + ?Sized> RemoteStore for Arc<S> {
    fn fetch_definition(&self, key: &DefinitionKey) -> Result<Settings> {
        (**self).fetch_definition(key)
    }

    fn upsert_definition(&self, key: &DefinitionKey, settings: &Settings) -> Result<()> {
        (**self).upsert_definition(key, settings)
    }
}

impl<S: RemoteStore + ?Sized> RemoteStore for Box<S> {
    fn fetch_definition(&self, key: &DefinitionKey) -> Result<Settings> {
        (**self).fetch_definition(key)
    }

    fn upsert_definition(&self, key: &DefinitionKey, settings: &Settings) -> Result<()> {
        (**self).upsert_definition(key, settings)
    }
}
