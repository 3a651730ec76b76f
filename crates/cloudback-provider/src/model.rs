use serde::{Deserialize, Serialize};

/// Scheduling settings of a backup definition. Always submitted as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    pub enabled: bool,
    pub schedule: String,
    pub storage: String,
    pub retention: String,
}

impl Settings {
    /// Settings submitted on delete: disabled, everything else empty.
    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Local record of a backup definition as declared in config or kept in state.
///
/// Identity is either the legacy `repository` field or the
/// `subject_type`/`subject_name` pair; see [`crate::identity`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackupDefinition {
    pub platform: String,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    /// Deprecated: use `subject_type` and `subject_name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    pub settings: Settings,
}

/// Canonical subject address after identity resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subject {
    pub subject_type: String,
    pub subject_name: String,
}

/// Full remote key of a definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefinitionKey {
    pub platform: String,
    pub account: String,
    pub subject: Subject,
}

impl std::fmt::Display for DefinitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.platform, self.account, self.subject.subject_type, self.subject.subject_name
        )
    }
}
