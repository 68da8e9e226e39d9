//! Parsers for the JSON documents generation-4 servers return.

use std::collections::BTreeMap;

use serde::Deserialize;

use dor_types::{DatastreamBrief, ObjectProfile, ObjectState, RepositoryInfo};

use crate::error::{ApiError, ApiResult};
use crate::serializer::{opt_text, parse_datetime};

/// A JSON field that may hold one value or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(vs) => vs,
        }
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> ApiResult<T> {
    serde_json::from_str(body)
        .map_err(|e| ApiError::Parse(format!("invalid {what} document: {e}")))
}

#[derive(Debug, Deserialize)]
struct DescribeDoc {
    #[serde(rename = "repositoryName")]
    name: Option<String>,
    #[serde(rename = "repositoryBaseURL")]
    base_url: Option<String>,
    #[serde(rename = "repositoryVersion")]
    version: String,
    #[serde(rename = "repositoryPidNamespace")]
    pid_namespace: Option<String>,
}

/// Parse the describe document.
pub fn describe(body: &str) -> ApiResult<RepositoryInfo> {
    let doc: DescribeDoc = decode(body, "describe")?;
    Ok(RepositoryInfo {
        name: doc.name.as_deref().and_then(opt_text),
        base_url: doc.base_url.as_deref().and_then(opt_text),
        version: doc.version,
        pid_namespace: doc.pid_namespace.as_deref().and_then(opt_text),
        retain_namespaces: Vec::new(),
    })
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    model: Option<OneOrMany<String>>,
}

#[derive(Debug, Deserialize)]
struct ObjectProfileDoc {
    #[serde(rename = "objLabel")]
    label: Option<String>,
    #[serde(rename = "objOwnerId")]
    owner: Option<String>,
    #[serde(rename = "objState")]
    state: Option<String>,
    #[serde(rename = "objCreateDate")]
    created: Option<String>,
    #[serde(rename = "objLastModDate")]
    modified: Option<String>,
    #[serde(rename = "objModels")]
    models: Option<ModelList>,
}

/// Parse an object profile document.
pub fn object_profile(body: &str) -> ApiResult<ObjectProfile> {
    let doc: ObjectProfileDoc = decode(body, "object profile")?;
    let mut profile = ObjectProfile {
        label: doc.label.as_deref().and_then(opt_text),
        owner: doc.owner.as_deref().and_then(opt_text),
        ..Default::default()
    };
    if let Some(code) = doc.state.as_deref().and_then(opt_text) {
        profile.state = ObjectState::from_code(&code)?;
    }
    if let Some(created) = doc.created.as_deref().and_then(opt_text) {
        profile.created = Some(parse_datetime(&created)?);
    }
    if let Some(modified) = doc.modified.as_deref().and_then(opt_text) {
        profile.modified = Some(parse_datetime(&modified)?);
    }
    if let Some(models) = doc.models.and_then(|m| m.model) {
        profile.models = models.into_vec();
    }
    Ok(profile)
}

#[derive(Debug, Deserialize)]
struct DatastreamEntry {
    #[serde(rename = "@dsid")]
    dsid: String,
    #[serde(rename = "@label")]
    label: Option<String>,
    #[serde(rename = "@mimeType")]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatastreamListDoc {
    #[serde(default)]
    datastream: Option<OneOrMany<DatastreamEntry>>,
}

/// Parse the list-datastreams document.
pub fn datastream_list(body: &str) -> ApiResult<Vec<DatastreamBrief>> {
    let doc: DatastreamListDoc = decode(body, "datastream list")?;
    let entries = doc.datastream.map(OneOrMany::into_vec).unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|e| DatastreamBrief {
            dsid: e.dsid,
            label: e.label.as_deref().and_then(opt_text),
            mime_type: e.mime_type.as_deref().and_then(opt_text),
        })
        .collect())
}

/// Parse the registered-namespaces document: a flat prefix-to-URI map.
pub fn namespaces(body: &str) -> ApiResult<BTreeMap<String, String>> {
    decode(body, "namespaces")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_document() {
        let body = r#"{
            "repositoryName": "Fedora Repository",
            "repositoryBaseURL": "http://localhost:8080/rest",
            "repositoryVersion": "4.0.0-alpha-3"
        }"#;
        let info = describe(body).unwrap();
        assert_eq!(info.version, "4.0.0-alpha-3");
        assert_eq!(info.name.as_deref(), Some("Fedora Repository"));
        assert!(info.pid_namespace.is_none());
    }

    #[test]
    fn object_profile_with_model_list() {
        let body = r#"{
            "pid": "test:1",
            "objLabel": "Test Object",
            "objOwnerId": "",
            "objState": "A",
            "objCreateDate": "2013-01-01T00:00:00.000Z",
            "objLastModDate": "2013-01-02T00:00:00.000Z",
            "objModels": {"model": ["info:fedora/fedora-system:FedoraObject-3.0"]}
        }"#;
        let profile = object_profile(body).unwrap();
        assert_eq!(profile.label.as_deref(), Some("Test Object"));
        // Empty strings are absent values, not values.
        assert_eq!(profile.owner, None);
        assert_eq!(profile.models.len(), 1);
        assert_eq!(profile.state, ObjectState::Active);
    }

    #[test]
    fn object_profile_with_single_model() {
        let body = r#"{"objModels": {"model": "info:fedora/fedora-system:FedoraObject-3.0"}}"#;
        let profile = object_profile(body).unwrap();
        assert_eq!(profile.models.len(), 1);
    }

    #[test]
    fn datastream_list_single_and_many() {
        let many = r#"{"datastream": [
            {"@dsid": "DC", "@label": "Dublin Core", "@mimeType": "text/xml"},
            {"@dsid": "OBJ", "@label": "", "@mimeType": "application/pdf"}
        ]}"#;
        let list = datastream_list(many).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].label, None);

        let single = r#"{"datastream": {"@dsid": "DC", "@label": "x", "@mimeType": "text/xml"}}"#;
        let list = datastream_list(single).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].dsid, "DC");
    }

    #[test]
    fn empty_datastream_list() {
        let list = datastream_list("{}").unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn namespaces_map() {
        let body = r#"{"islandora": "http://islandora.ca/ontology/", "test": "http://example.org/"}"#;
        let map = namespaces(body).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["test"], "http://example.org/");
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(matches!(describe("not json"), Err(ApiError::Parse(_))));
    }
}
