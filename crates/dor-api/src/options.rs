//! Option structs for the binding's calls.
//!
//! Every field is optional; a `None` never reaches the wire. Enumerated
//! values are typed, so an out-of-enum string cannot be expressed at all.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use dor_types::{ChecksumKind, ControlGroup, ObjectState, Pid};

/// Where a datastream's content comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatastreamContent {
    Bytes(Vec<u8>),
    File(PathBuf),
    /// A location the repository records or proxies; the only legal source
    /// for redirect and external datastreams.
    Url(String),
}

impl DatastreamContent {
    pub fn is_url(&self) -> bool {
        matches!(self, Self::Url(_))
    }
}

/// Body of an object-create call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestBody {
    /// An archival XML document as a string.
    Xml(String),
    /// An archival XML document on disk.
    File(PathBuf),
}

/// Options for creating an object.
#[derive(Clone, Debug, Default)]
pub struct IngestOptions {
    /// Identifier to create under; server-assigned when absent.
    pub pid: Option<Pid>,
    pub body: Option<IngestBody>,
    pub label: Option<String>,
    pub format: Option<String>,
    pub encoding: Option<String>,
    /// Namespace for a server-assigned identifier; ignored when a body
    /// carries its own identifier.
    pub namespace: Option<String>,
    pub owner: Option<String>,
    pub log_message: Option<String>,
}

/// Options for adding a datastream.
#[derive(Clone, Debug, Default)]
pub struct AddDatastreamOptions {
    pub control_group: Option<ControlGroup>,
    pub alt_ids: Vec<String>,
    pub label: Option<String>,
    pub versionable: Option<bool>,
    pub state: Option<ObjectState>,
    pub format_uri: Option<String>,
    pub checksum_kind: Option<ChecksumKind>,
    pub checksum: Option<String>,
    pub mime_type: Option<String>,
    pub log_message: Option<String>,
}

/// Options for modifying a datastream. A `None` leaves the corresponding
/// property untouched on the server.
#[derive(Clone, Debug, Default)]
pub struct ModifyDatastreamOptions {
    pub content: Option<DatastreamContent>,
    pub alt_ids: Option<Vec<String>>,
    pub label: Option<String>,
    pub versionable: Option<bool>,
    pub state: Option<ObjectState>,
    pub format_uri: Option<String>,
    pub checksum_kind: Option<ChecksumKind>,
    pub checksum: Option<String>,
    pub mime_type: Option<String>,
    pub log_message: Option<String>,
    /// Last known modification time, for opportunistic locking; the server
    /// answers 409 when the datastream changed since.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Options for modifying object-level properties.
#[derive(Clone, Debug, Default)]
pub struct ModifyObjectOptions {
    pub label: Option<String>,
    pub owner: Option<String>,
    pub state: Option<ObjectState>,
    pub log_message: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl ModifyObjectOptions {
    /// Whether any property change was requested at all.
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.owner.is_none() && self.state.is_none()
    }
}

/// Options for purging datastream versions.
#[derive(Clone, Debug, Default)]
pub struct PurgeDatastreamOptions {
    /// Inclusive start of the version range; earliest when absent.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive end of the version range; latest when absent.
    pub end: Option<DateTime<Utc>>,
    pub log_message: Option<String>,
}

/// Options for profile and content fetches that can address a point in the
/// object's history.
#[derive(Clone, Debug, Default)]
pub struct ProfileQueryOptions {
    pub as_of: Option<DateTime<Utc>>,
    pub validate_checksum: Option<bool>,
}

/// Options for exporting an object's archival form.
#[derive(Clone, Debug, Default)]
pub struct ExportOptions {
    pub format: Option<String>,
    /// `public`, `migrate`, or `archive` in the remote interface's terms.
    pub context: Option<String>,
    pub encoding: Option<String>,
}

/// The two find-objects query modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchKind {
    /// A phrase matched against any field.
    Terms,
    /// A sequence of field conditions.
    Query,
}

/// Options for the find-objects search.
#[derive(Clone, Debug)]
pub struct FindObjectsOptions {
    pub kind: SearchKind,
    pub text: String,
    pub max_results: Option<u32>,
    /// Field names to ask for; the conventional default is pid and title.
    pub fields: Vec<String>,
}

impl FindObjectsOptions {
    pub fn terms(text: impl Into<String>) -> Self {
        Self {
            kind: SearchKind::Terms,
            text: text.into(),
            max_results: None,
            fields: vec!["pid".into(), "title".into()],
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self {
            kind: SearchKind::Query,
            text: text.into(),
            max_results: None,
            fields: vec!["pid".into(), "title".into()],
        }
    }

    pub fn with_max_results(mut self, max: u32) -> Self {
        self.max_results = Some(max);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = fields;
        self
    }
}

/// Paging state of an unfinished search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchSession {
    pub token: String,
    pub cursor: Option<u64>,
    pub expires: Option<String>,
}

/// One page of find-objects results.
///
/// Fields can be multivalued, so every value is a list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FindObjectsResult {
    pub session: Option<SearchSession>,
    pub results: Vec<BTreeMap<String, Vec<String>>>,
}

/// One datastream in a batched multi-add call.
#[derive(Clone, Debug)]
pub struct BatchDatastream {
    pub dsid: String,
    pub control_group: ControlGroup,
    pub content: DatastreamContent,
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modify_object_emptiness() {
        assert!(ModifyObjectOptions::default().is_empty());
        let opts = ModifyObjectOptions {
            label: Some("x".into()),
            ..Default::default()
        };
        assert!(!opts.is_empty());
    }

    #[test]
    fn find_objects_defaults() {
        let opts = FindObjectsOptions::terms("islandora*");
        assert_eq!(opts.kind, SearchKind::Terms);
        assert_eq!(opts.fields, vec!["pid".to_string(), "title".to_string()]);
        assert!(opts.max_results.is_none());
    }
}
