//! Write-oriented management calls.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use dor_http::{Method, MultipartField, Request, RequestBody};
use dor_rels::{RelationshipDocument, Triple};
use dor_types::{ControlGroup, DatastreamProfile, Pid, Validation};

use crate::api_a::format_timestamp;
use crate::binding::Shared;
use crate::error::{ApiError, ApiResult};
use crate::options::{
    AddDatastreamOptions, BatchDatastream, DatastreamContent, ExportOptions, IngestBody,
    IngestOptions, ModifyDatastreamOptions, ModifyObjectOptions, ProfileQueryOptions,
    PurgeDatastreamOptions,
};
use crate::serializer::{json4, xml3};
use crate::version::Dialect;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// The management surface: ingest, modify, purge, relationships.
#[derive(Clone)]
pub struct ApiM {
    shared: Arc<Shared>,
}

impl ApiM {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Create an object and return its identifier.
    ///
    /// With no body the server creates an empty object (under the given pid,
    /// or a minted one); a body carries a full archival document.
    pub async fn ingest(&self, options: IngestOptions) -> ApiResult<Pid> {
        let path = match &options.pid {
            Some(pid) => format!("/objects/{pid}"),
            None => "/objects/new".to_string(),
        };
        let mut request = Request::post(path)
            .query_opt("label", options.label.as_deref())
            .query_opt("format", options.format.as_deref())
            .query_opt("encoding", options.encoding.as_deref())
            .query_opt("namespace", options.namespace.as_deref())
            .query_opt("ownerId", options.owner.as_deref())
            .query_opt("logMessage", options.log_message.as_deref());
        request = match options.body {
            Some(IngestBody::Xml(content)) => request.body(RequestBody::Text {
                content,
                content_type: "text/xml".into(),
            }),
            Some(IngestBody::File(path)) => request.body(RequestBody::File {
                path,
                content_type: Some("text/xml".into()),
            }),
            None => request,
        };
        let response = self.shared.execute(request).await?;
        let body = response.text().map_err(ApiError::from)?;
        Pid::new(body.trim()).map_err(|_| {
            ApiError::Parse(format!("ingest response is not a pid: {}", body.trim()))
        })
    }

    /// Add a datastream to an object.
    ///
    /// Redirect and external control groups only accept a URL source, and
    /// inline XML only a payload; handing over the wrong source fails before
    /// anything reaches the wire.
    pub async fn add_datastream(
        &self,
        pid: &Pid,
        dsid: &str,
        content: DatastreamContent,
        options: &AddDatastreamOptions,
    ) -> ApiResult<DatastreamProfile> {
        if let Some(group) = options.control_group {
            check_content_legality(group, &content)?;
        }
        let info = self.shared.server_info().await?;
        let method = match info.dialect {
            Dialect::XmlV3 => Method::Post,
            Dialect::JsonV4 => Method::Put,
        };
        let mut request = Request {
            method: Some(method),
            path: format!("/objects/{pid}/datastreams/{dsid}"),
            ..Default::default()
        };
        request = request
            .query_opt("controlGroup", options.control_group.map(|g| g.code()))
            .query_opt("altIDs", join_alt_ids(&options.alt_ids))
            .query_opt("dsLabel", options.label.as_deref())
            .query_opt("versionable", options.versionable)
            .query_opt("dsState", options.state.map(|s| s.code()))
            .query_opt("formatURI", options.format_uri.as_deref())
            .query_opt("checksumType", options.checksum_kind.map(|k| k.as_str()))
            .query_opt("checksum", options.checksum.as_deref())
            .query_opt("mimeType", options.mime_type.as_deref())
            .query_opt("logMessage", options.log_message.as_deref());
        request = attach_content(request, content, options.mime_type.as_deref());

        let response = self.shared.execute_for(pid.as_str(), request).await?;
        match info.dialect {
            Dialect::XmlV3 => {
                xml3::datastream_profile(&response.text().map_err(ApiError::from)?)
            }
            // Generation-4 servers answer the add call with an empty body;
            // fetch the resulting profile instead.
            Dialect::JsonV4 => {
                self.datastream_profile(pid, dsid, &ProfileQueryOptions::default())
                    .await
            }
        }
    }

    /// Add several datastreams in one multipart call. The server applies
    /// the batch atomically: if any one fails, none are persisted.
    pub async fn add_datastreams(&self, pid: &Pid, batch: Vec<BatchDatastream>) -> ApiResult<()> {
        self.shared
            .require("batched datastream add", |caps| caps.batch_datastream_add)
            .await?;
        let mut fields = Vec::with_capacity(batch.len());
        for entry in batch {
            check_content_legality(entry.control_group, &entry.content)?;
            fields.push(match entry.content {
                DatastreamContent::Bytes(content) => MultipartField::Bytes {
                    name: entry.dsid,
                    content,
                    content_type: entry.mime_type,
                },
                DatastreamContent::File(path) => MultipartField::File {
                    name: entry.dsid,
                    path,
                    content_type: entry.mime_type,
                },
                DatastreamContent::Url(url) => MultipartField::Text {
                    name: entry.dsid,
                    value: url,
                },
            });
        }
        let request = Request::post(format!("/objects/{pid}/datastreams"))
            .body(RequestBody::Multipart(fields));
        self.shared.execute_for(pid.as_str(), request).await?;
        Ok(())
    }

    /// Fetch a datastream's profile.
    pub async fn datastream_profile(
        &self,
        pid: &Pid,
        dsid: &str,
        options: &ProfileQueryOptions,
    ) -> ApiResult<DatastreamProfile> {
        let request = Request::get(format!("/objects/{pid}/datastreams/{dsid}"))
            .query("format", "xml")
            .query_opt(
                "asOfDateTime",
                options.as_of.map(|dt| format_timestamp(&dt)),
            )
            .query_opt("validateChecksum", options.validate_checksum);
        let id = format!("{pid}/{dsid}");
        let response = self.shared.execute_for(&id, request).await?;
        xml3::datastream_profile(&response.text().map_err(ApiError::from)?)
    }

    /// Profiles of every stored version of a datastream, newest first.
    pub async fn datastream_history(
        &self,
        pid: &Pid,
        dsid: &str,
    ) -> ApiResult<Vec<DatastreamProfile>> {
        self.shared
            .require("datastream history", |caps| caps.datastream_history)
            .await?;
        let request = Request::get(format!("/objects/{pid}/datastreams/{dsid}/history"))
            .query("format", "xml");
        let id = format!("{pid}/{dsid}");
        let response = self.shared.execute_for(&id, request).await?;
        xml3::datastream_history(&response.text().map_err(ApiError::from)?)
    }

    /// Modify a datastream's properties, content, or both.
    pub async fn modify_datastream(
        &self,
        pid: &Pid,
        dsid: &str,
        options: ModifyDatastreamOptions,
    ) -> ApiResult<DatastreamProfile> {
        let info = self.shared.server_info().await?;
        let mut request = Request::put(format!("/objects/{pid}/datastreams/{dsid}"))
            .query_opt("altIDs", options.alt_ids.as_deref().and_then(join_alt_ids))
            .query_opt("dsLabel", options.label.as_deref())
            .query_opt("versionable", options.versionable)
            .query_opt("dsState", options.state.map(|s| s.code()))
            .query_opt("formatURI", options.format_uri.as_deref())
            .query_opt("checksumType", options.checksum_kind.map(|k| k.as_str()))
            .query_opt("checksum", options.checksum.as_deref())
            .query_opt("mimeType", options.mime_type.as_deref())
            .query_opt("logMessage", options.log_message.as_deref())
            .query_opt(
                "lastModifiedDate",
                options.last_modified.map(|dt| format_timestamp(&dt)),
            );
        if let Some(content) = options.content {
            request = attach_content(request, content, options.mime_type.as_deref());
        }
        let id = format!("{pid}/{dsid}");
        let response = self.shared.execute_for(&id, request).await?;
        match info.dialect {
            Dialect::XmlV3 => {
                xml3::datastream_profile(&response.text().map_err(ApiError::from)?)
            }
            Dialect::JsonV4 => {
                self.datastream_profile(pid, dsid, &ProfileQueryOptions::default())
                    .await
            }
        }
    }

    /// Modify object-level properties. Returns the server's modification
    /// timestamp.
    pub async fn modify_object(
        &self,
        pid: &Pid,
        options: &ModifyObjectOptions,
    ) -> ApiResult<String> {
        let request = Request::put(format!("/objects/{pid}"))
            .query_opt("label", options.label.as_deref())
            .query_opt("ownerId", options.owner.as_deref())
            .query_opt("state", options.state.map(|s| s.code()))
            .query_opt("logMessage", options.log_message.as_deref())
            .query_opt(
                "lastModifiedDate",
                options.last_modified.map(|dt| format_timestamp(&dt)),
            );
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        Ok(response.text().map_err(ApiError::from)?.trim().to_string())
    }

    /// Purge datastream versions. Returns the timestamps of the purged
    /// versions.
    pub async fn purge_datastream(
        &self,
        pid: &Pid,
        dsid: &str,
        options: &PurgeDatastreamOptions,
    ) -> ApiResult<Vec<String>> {
        let request = Request::delete(format!("/objects/{pid}/datastreams/{dsid}"))
            .query_opt("startDT", options.start.map(|dt| format_timestamp(&dt)))
            .query_opt("endDT", options.end.map(|dt| format_timestamp(&dt)))
            .query_opt("logMessage", options.log_message.as_deref());
        let id = format!("{pid}/{dsid}");
        let response = self.shared.execute_for(&id, request).await?;
        let body = response.text().map_err(ApiError::from)?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::Parse(format!("invalid purge response: {e}")))
    }

    /// Purge an object permanently. Returns the server's deletion timestamp.
    pub async fn purge_object(&self, pid: &Pid, log_message: Option<&str>) -> ApiResult<String> {
        let request =
            Request::delete(format!("/objects/{pid}")).query_opt("logMessage", log_message);
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        Ok(response.text().map_err(ApiError::from)?.trim().to_string())
    }

    /// Ask the server for unused identifiers.
    pub async fn next_pid(
        &self,
        namespace: Option<&str>,
        count: Option<u32>,
    ) -> ApiResult<Vec<Pid>> {
        let request = Request::post("/nextPID")
            .query("format", "xml")
            .query_opt("namespace", namespace)
            .query_opt("numPIDs", count);
        let response = self.shared.execute(request).await?;
        xml3::pid_list(&response.text().map_err(ApiError::from)?)
    }

    /// Export an object's archival form.
    pub async fn export_object(&self, pid: &Pid, options: &ExportOptions) -> ApiResult<String> {
        let request = Request::get(format!("/objects/{pid}/export"))
            .query_opt("context", options.context.as_deref())
            .query_opt("format", options.format.as_deref())
            .query_opt("encoding", options.encoding.as_deref());
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        response.text().map_err(ApiError::from)
    }

    /// The object's raw archival XML.
    pub async fn object_xml(&self, pid: &Pid) -> ApiResult<String> {
        let request = Request::get(format!("/objects/{pid}/objectXML"));
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        response.text().map_err(ApiError::from)
    }

    /// Record one relationship triple against an object.
    pub async fn add_relationship(&self, pid: &Pid, triple: &Triple) -> ApiResult<()> {
        let request = Request::post(format!("/objects/{pid}/relationships/new"))
            .query_opt("subject", triple.subject.as_deref())
            .query("predicate", triple.predicate.uri())
            .query("object", triple.object.value())
            .query("isLiteral", triple.object.is_literal());
        let request = match &triple.object {
            dor_rels::TripleObject::Literal {
                datatype: Some(dt), ..
            } => request.query("datatype", dt),
            _ => request,
        };
        self.shared.execute_for(pid.as_str(), request).await?;
        Ok(())
    }

    /// Fetch an object's relationships, optionally filtered by subject or
    /// predicate URI.
    pub async fn relationships(
        &self,
        pid: &Pid,
        subject: Option<&str>,
        predicate: Option<&str>,
    ) -> ApiResult<Vec<Triple>> {
        let request = Request::get(format!("/objects/{pid}/relationships"))
            .query("format", "xml")
            .query_opt("subject", subject)
            .query_opt("predicate", predicate);
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        let document = RelationshipDocument::parse(&response.text().map_err(ApiError::from)?)
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(document.triples().to_vec())
    }

    /// Remove one relationship triple. Returns whether the server found and
    /// removed it.
    pub async fn purge_relationship(&self, pid: &Pid, triple: &Triple) -> ApiResult<bool> {
        let request = Request::delete(format!("/objects/{pid}/relationships"))
            .query_opt("subject", triple.subject.as_deref())
            .query("predicate", triple.predicate.uri())
            .query("object", triple.object.value())
            .query("isLiteral", triple.object.is_literal());
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        Ok(response.text().map_err(ApiError::from)?.trim() == "true")
    }

    /// Ask the server to validate an object against its content models.
    pub async fn validate_object(
        &self,
        pid: &Pid,
        as_of: Option<DateTime<Utc>>,
    ) -> ApiResult<Validation> {
        let request = Request::get(format!("/objects/{pid}/validate"))
            .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt)));
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        xml3::validation(&response.text().map_err(ApiError::from)?)
    }

    /// Upload a file to the server's staging area; the returned URI can be
    /// used as a datastream location.
    pub async fn upload(&self, path: &Path) -> ApiResult<String> {
        let request = Request::post("/upload").body(RequestBody::Multipart(vec![
            MultipartField::File {
                name: "file".into(),
                path: path.to_path_buf(),
                content_type: None,
            },
        ]));
        let response = self.shared.execute(request).await?;
        Ok(response.text().map_err(ApiError::from)?.trim().to_string())
    }

    /// Register a namespace prefix with the server.
    pub async fn register_namespace(&self, prefix: &str, uri: &str) -> ApiResult<()> {
        self.shared
            .require("namespace registry", |caps| caps.namespace_registry)
            .await?;
        let request = Request::post(format!("/namespaces/{prefix}")).body(RequestBody::Text {
            content: uri.to_string(),
            content_type: "text/plain".into(),
        });
        self.shared.execute(request).await?;
        Ok(())
    }

    /// The server's registered namespace prefixes.
    pub async fn registered_namespaces(&self) -> ApiResult<BTreeMap<String, String>> {
        self.shared
            .require("namespace registry", |caps| caps.namespace_registry)
            .await?;
        let request = Request::get("/namespaces").header("Accept", "application/json");
        let response = self.shared.execute(request).await?;
        json4::namespaces(&response.text().map_err(ApiError::from)?)
    }
}

/// Reject content sources the control group cannot store.
fn check_content_legality(group: ControlGroup, content: &DatastreamContent) -> ApiResult<()> {
    if group.requires_url() && !content.is_url() {
        return Err(ApiError::BadArgument(format!(
            "control group {group} only accepts a URL content source"
        )));
    }
    if group == ControlGroup::InlineXml && content.is_url() {
        return Err(ApiError::BadArgument(
            "control group X only accepts an inline payload".into(),
        ));
    }
    Ok(())
}

/// Attach a content source: URLs travel as the dsLocation parameter, real
/// payloads as the request body.
fn attach_content(
    request: Request,
    content: DatastreamContent,
    mime_type: Option<&str>,
) -> Request {
    match content {
        DatastreamContent::Url(url) => request.query("dsLocation", url),
        DatastreamContent::Bytes(content) => request.body(RequestBody::Bytes {
            content,
            content_type: mime_type.unwrap_or(DEFAULT_CONTENT_TYPE).to_string(),
        }),
        DatastreamContent::File(path) => request.body(RequestBody::File {
            path,
            content_type: mime_type.map(str::to_owned),
        }),
    }
}

fn join_alt_ids(alt_ids: &[String]) -> Option<String> {
    if alt_ids.is_empty() {
        None
    } else {
        Some(alt_ids.join(" "))
    }
}
