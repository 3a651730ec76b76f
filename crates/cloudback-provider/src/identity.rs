//! Subject identity resolution.
//!
//! A record addresses its subject either through the deprecated `repository`
//! field or through the `subject_type`/`subject_name` pair. [`SubjectRef`]
//! captures which form was used; everything past this module only sees a
//! canonical [`Subject`].

use crate::error::{Error, Result};
use crate::model::{BackupDefinition, DefinitionKey, Subject};

pub const LEGACY_SUBJECT_TYPE: &str = "Repository";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectRef<'a> {
    Subject {
        subject_type: &'a str,
        subject_name: &'a str,
    },
    LegacyRepository(&'a str),
}

impl<'a> SubjectRef<'a> {
    /// Picks the addressing form of `record`. A complete generalized pair wins
    /// over the legacy field; a partial pair is ignored.
    pub fn of(record: &'a BackupDefinition) -> Result<Self> {
        match (
            record.subject_type.as_deref(),
            record.subject_name.as_deref(),
            record.repository.as_deref(),
        ) {
            (Some(subject_type), Some(subject_name), _) => Ok(Self::Subject {
                subject_type,
                subject_name,
            }),
            (_, _, Some(repository)) => Ok(Self::LegacyRepository(repository)),
            _ => Err(Error::MissingIdentity),
        }
    }

    pub fn into_subject(self) -> Subject {
        match self {
            Self::Subject {
                subject_type,
                subject_name,
            } => Subject {
                subject_type: subject_type.to_string(),
                subject_name: subject_name.to_string(),
            },
            Self::LegacyRepository(repository) => Subject {
                subject_type: LEGACY_SUBJECT_TYPE.to_string(),
                subject_name: repository.to_string(),
            },
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::LegacyRepository(_))
    }
}

pub fn resolve(record: &BackupDefinition) -> Result<Subject> {
    SubjectRef::of(record).map(SubjectRef::into_subject)
}

pub fn resolve_key(record: &BackupDefinition) -> Result<DefinitionKey> {
    Ok(DefinitionKey {
        platform: record.platform.clone(),
        account: record.account.clone(),
        subject: resolve(record)?,
    })
}
