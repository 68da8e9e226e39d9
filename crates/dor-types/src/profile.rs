use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::ChecksumKind;
use crate::control::ControlGroup;
use crate::state::ObjectState;

/// Parsed object profile document.
///
/// Fields the server omitted are `None`; the serializer never substitutes
/// empty-string placeholders.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectProfile {
    pub label: Option<String>,
    pub owner: Option<String>,
    pub state: ObjectState,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// Content-model resource URIs attached to the object.
    pub models: Vec<String>,
}

/// Parsed datastream profile document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatastreamProfile {
    pub label: Option<String>,
    pub version_id: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub state: ObjectState,
    pub mime_type: Option<String>,
    pub format_uri: Option<String>,
    pub control_group: ControlGroup,
    pub size: Option<u64>,
    pub versionable: bool,
    pub checksum_kind: Option<ChecksumKind>,
    pub checksum: Option<String>,
    pub location: Option<String>,
    pub location_type: Option<String>,
    pub alt_ids: Vec<String>,
}

/// One row of the list-datastreams document: just enough to enumerate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastreamBrief {
    pub dsid: String,
    pub label: Option<String>,
    pub mime_type: Option<String>,
}

/// The `/describe` document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub version: String,
    /// Default pid namespace the server mints identifiers in.
    pub pid_namespace: Option<String>,
    /// Namespaces the server will retain identifiers for.
    pub retain_namespaces: Vec<String>,
}

/// Result of a server-side object validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub content_models: Vec<String>,
    pub problems: Vec<String>,
    /// Problems keyed by datastream identifier.
    pub datastream_problems: BTreeMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_defaults_are_empty() {
        let profile = ObjectProfile::default();
        assert_eq!(profile.state, ObjectState::Active);
        assert!(profile.label.is_none());
        assert!(profile.models.is_empty());
    }

    #[test]
    fn datastream_profile_serde_roundtrip() {
        let profile = DatastreamProfile {
            label: Some("Dublin Core".into()),
            control_group: ControlGroup::InlineXml,
            size: Some(341),
            versionable: true,
            checksum_kind: Some(ChecksumKind::Disabled),
            ..Default::default()
        };
        let json = serde_json::to_string(&profile).unwrap();
        let parsed: DatastreamProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn validation_defaults_invalid() {
        let v = Validation::default();
        assert!(!v.valid);
        assert!(v.datastream_problems.is_empty());
    }
}
