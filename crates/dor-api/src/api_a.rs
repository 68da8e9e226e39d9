//! Read-oriented access calls.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};

use dor_http::Request;
use dor_types::{DatastreamBrief, ObjectProfile, Pid, RepositoryInfo};

use crate::binding::Shared;
use crate::error::{ApiError, ApiResult};
use crate::options::{FindObjectsOptions, FindObjectsResult, SearchKind};
use crate::serializer::{json4, xml3};
use crate::version::{Capabilities, Dialect, ServerVersion};

pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The access surface: describe, profiles, listings, content.
#[derive(Clone)]
pub struct ApiA {
    shared: Arc<Shared>,
}

impl ApiA {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Fetch the repository's describe document. One round trip per call;
    /// version detection memoizes separately.
    pub async fn describe_repository(&self) -> ApiResult<RepositoryInfo> {
        self.shared.describe().await
    }

    /// The server's version, detected once per binding.
    pub async fn server_version(&self) -> ApiResult<ServerVersion> {
        Ok(self.shared.server_info().await?.version)
    }

    /// What this server can do, detected once per binding.
    pub async fn capabilities(&self) -> ApiResult<Capabilities> {
        Ok(self.shared.server_info().await?.capabilities)
    }

    /// Field search over the object index.
    pub async fn find_objects(&self, options: &FindObjectsOptions) -> ApiResult<FindObjectsResult> {
        self.shared
            .require("field search", |caps| caps.field_search)
            .await?;
        let mut request = Request::get("/objects").query("resultFormat", "xml");
        request = match options.kind {
            SearchKind::Terms => request.query("terms", &options.text),
            SearchKind::Query => request.query("query", &options.text),
        };
        request = request.query_opt("maxResults", options.max_results);
        for field in &options.fields {
            request = request.query(field, "true");
        }
        let response = self.shared.execute(request).await?;
        xml3::find_objects(&response.text().map_err(ApiError::from)?)
    }

    /// Fetch the next page of an unfinished field search.
    pub async fn resume_find_objects(&self, token: &str) -> ApiResult<FindObjectsResult> {
        self.shared
            .require("field search", |caps| caps.field_search)
            .await?;
        let request = Request::get("/objects")
            .query("resultFormat", "xml")
            .query("sessionToken", token);
        let response = self.shared.execute(request).await?;
        xml3::find_objects(&response.text().map_err(ApiError::from)?)
    }

    /// Fetch an object's profile, optionally as of a point in its history.
    pub async fn object_profile(
        &self,
        pid: &Pid,
        as_of: Option<DateTime<Utc>>,
    ) -> ApiResult<ObjectProfile> {
        let info = self.shared.server_info().await?;
        let path = format!("/objects/{pid}");
        let request = match info.dialect {
            Dialect::XmlV3 => Request::get(path)
                .query("format", "xml")
                .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt))),
            Dialect::JsonV4 => Request::get(path)
                .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt)))
                .header("Accept", "application/json"),
        };
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        let body = response.text().map_err(ApiError::from)?;
        match info.dialect {
            Dialect::XmlV3 => xml3::object_profile(&body),
            Dialect::JsonV4 => json4::object_profile(&body),
        }
    }

    /// List an object's datastreams.
    pub async fn list_datastreams(
        &self,
        pid: &Pid,
        as_of: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<DatastreamBrief>> {
        let info = self.shared.server_info().await?;
        let path = format!("/objects/{pid}/datastreams");
        let request = match info.dialect {
            Dialect::XmlV3 => Request::get(path)
                .query("format", "xml")
                .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt))),
            Dialect::JsonV4 => Request::get(path)
                .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt)))
                .header("Accept", "application/json"),
        };
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        let body = response.text().map_err(ApiError::from)?;
        match info.dialect {
            Dialect::XmlV3 => xml3::datastream_list(&body),
            Dialect::JsonV4 => json4::datastream_list(&body),
        }
    }

    /// Fetch a datastream's content into memory.
    pub async fn datastream_content(
        &self,
        pid: &Pid,
        dsid: &str,
        as_of: Option<DateTime<Utc>>,
    ) -> ApiResult<Bytes> {
        let request = Request::get(format!("/objects/{pid}/datastreams/{dsid}/content"))
            .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt)));
        let id = format!("{pid}/{dsid}");
        let response = self.shared.execute_for(&id, request).await?;
        Ok(response.body)
    }

    /// Stream a datastream's content to a file instead of buffering it.
    pub async fn datastream_content_to_file(
        &self,
        pid: &Pid,
        dsid: &str,
        as_of: Option<DateTime<Utc>>,
        path: &Path,
    ) -> ApiResult<()> {
        let request = Request::get(format!("/objects/{pid}/datastreams/{dsid}/content"))
            .query_opt("asOfDateTime", as_of.map(|dt| format_timestamp(&dt)))
            .download_to(path);
        let id = format!("{pid}/{dsid}");
        self.shared.execute_for(&id, request).await?;
        Ok(())
    }

    /// Modification timestamps of an object, oldest first.
    pub async fn object_history(&self, pid: &Pid) -> ApiResult<Vec<DateTime<Utc>>> {
        self.shared
            .require("object history", |caps| caps.datastream_history)
            .await?;
        let request = Request::get(format!("/objects/{pid}/versions")).query("format", "xml");
        let response = self.shared.execute_for(pid.as_str(), request).await?;
        xml3::object_history(&response.text().map_err(ApiError::from)?)
    }

    /// The repository's RSS events feed.
    pub async fn events_feed(&self) -> ApiResult<String> {
        self.shared
            .require("events feed", |caps| caps.events_feed)
            .await?;
        let request = Request::get("/rss").header("Accept", "application/rss+xml");
        let response = self.shared.execute(request).await?;
        response.text().map_err(ApiError::from)
    }
}
