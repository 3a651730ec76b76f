use crate::error::{Error, Result};
use crate::model::BackupDefinition;

/// Parses an import identifier into a record with identity fields set and
/// default settings.
///
/// Accepted shapes:
/// - `platform/account/repository` (legacy field set)
/// - `platform/account/subject_type/subject_name`
pub fn parse(id: &str) -> Result<BackupDefinition> {
    let parts: Vec<&str> = id.split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::Format { id: id.to_string() });
    }
    match parts.as_slice() {
        [platform, account, repository] => Ok(BackupDefinition {
            platform: platform.to_string(),
            account: account.to_string(),
            repository: Some(repository.to_string()),
            ..Default::default()
        }),
        [platform, account, subject_type, subject_name] => Ok(BackupDefinition {
            platform: platform.to_string(),
            account: account.to_string(),
            subject_type: Some(subject_type.to_string()),
            subject_name: Some(subject_name.to_string()),
            ..Default::default()
        }),
        _ => Err(Error::Format { id: id.to_string() }),
    }
}
