//! The persisted-datastream facade.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use dor_api::{
    ApiResult, DatastreamContent, ModifyDatastreamOptions, ProfileQueryOptions, RepositoryApi,
};
use dor_types::{ChecksumKind, ControlGroup, DatastreamProfile, ObjectState, Pid};

use crate::error::{ObjectError, ObjectResult};

/// A datastream that exists in the repository.
///
/// The profile is fetched lazily on first read and memoized on the facade;
/// every mutator is one immediate modify round trip whose response replaces
/// the memo. [`refresh`](Self::refresh) drops the memo so the next read
/// re-fetches.
pub struct Datastream {
    pid: Pid,
    dsid: String,
    api: RepositoryApi,
    profile: RwLock<Option<DatastreamProfile>>,
}

impl std::fmt::Debug for Datastream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastream")
            .field("pid", &self.pid)
            .field("dsid", &self.dsid)
            .finish_non_exhaustive()
    }
}

impl Datastream {
    pub(crate) fn new(api: RepositoryApi, pid: Pid, dsid: String) -> Self {
        Self {
            pid,
            dsid,
            api,
            profile: RwLock::new(None),
        }
    }

    pub(crate) fn with_profile(
        api: RepositoryApi,
        pid: Pid,
        dsid: String,
        profile: DatastreamProfile,
    ) -> Self {
        Self {
            pid,
            dsid,
            api,
            profile: RwLock::new(Some(profile)),
        }
    }

    pub fn id(&self) -> &str {
        &self.dsid
    }

    /// The owning object's identifier.
    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// The memoized profile, fetching it on first use.
    pub async fn profile(&self) -> ObjectResult<DatastreamProfile> {
        if let Some(profile) = self.cached()? {
            return Ok(profile);
        }
        let fetched = self
            .api
            .m
            .datastream_profile(&self.pid, &self.dsid, &ProfileQueryOptions::default())
            .await?;
        self.store(fetched.clone())?;
        Ok(fetched)
    }

    /// Drop the memoized profile; the next read re-fetches.
    pub fn refresh(&self) -> ObjectResult<()> {
        *self.profile.write().map_err(|_| ObjectError::LockPoisoned)? = None;
        Ok(())
    }

    fn cached(&self) -> ObjectResult<Option<DatastreamProfile>> {
        Ok(self
            .profile
            .read()
            .map_err(|_| ObjectError::LockPoisoned)?
            .clone())
    }

    fn store(&self, profile: DatastreamProfile) -> ObjectResult<()> {
        *self.profile.write().map_err(|_| ObjectError::LockPoisoned)? = Some(profile);
        Ok(())
    }

    // ---- Accessors ----

    pub async fn label(&self) -> ObjectResult<Option<String>> {
        Ok(self.profile().await?.label)
    }

    pub async fn state(&self) -> ObjectResult<ObjectState> {
        Ok(self.profile().await?.state)
    }

    pub async fn mime_type(&self) -> ObjectResult<Option<String>> {
        Ok(self.profile().await?.mime_type)
    }

    pub async fn control_group(&self) -> ObjectResult<ControlGroup> {
        Ok(self.profile().await?.control_group)
    }

    pub async fn size(&self) -> ObjectResult<Option<u64>> {
        Ok(self.profile().await?.size)
    }

    pub async fn versionable(&self) -> ObjectResult<bool> {
        Ok(self.profile().await?.versionable)
    }

    pub async fn checksum(&self) -> ObjectResult<Option<(ChecksumKind, String)>> {
        let profile = self.profile().await?;
        Ok(match (profile.checksum_kind, profile.checksum) {
            (Some(kind), Some(value)) => Some((kind, value)),
            _ => None,
        })
    }

    pub async fn created(&self) -> ObjectResult<Option<DateTime<Utc>>> {
        Ok(self.profile().await?.created)
    }

    pub async fn location(&self) -> ObjectResult<Option<String>> {
        Ok(self.profile().await?.location)
    }

    // ---- Mutators: one modify round trip each ----

    async fn modify(&self, options: ModifyDatastreamOptions) -> ObjectResult<()> {
        let profile = self
            .api
            .m
            .modify_datastream(&self.pid, &self.dsid, options)
            .await?;
        self.store(profile)
    }

    pub async fn set_label(&self, label: impl Into<String>) -> ObjectResult<()> {
        self.modify(ModifyDatastreamOptions {
            label: Some(label.into()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_state(&self, state: ObjectState) -> ObjectResult<()> {
        self.modify(ModifyDatastreamOptions {
            state: Some(state),
            ..Default::default()
        })
        .await
    }

    pub async fn set_mime_type(&self, mime_type: impl Into<String>) -> ObjectResult<()> {
        self.modify(ModifyDatastreamOptions {
            mime_type: Some(mime_type.into()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_versionable(&self, versionable: bool) -> ObjectResult<()> {
        self.modify(ModifyDatastreamOptions {
            versionable: Some(versionable),
            ..Default::default()
        })
        .await
    }

    pub async fn set_checksum_kind(&self, kind: ChecksumKind) -> ObjectResult<()> {
        self.modify(ModifyDatastreamOptions {
            checksum_kind: Some(kind),
            ..Default::default()
        })
        .await
    }

    /// Set the state to deleted. The datastream and its history stay in the
    /// repository until purged.
    pub async fn delete(&self) -> ObjectResult<()> {
        self.set_state(ObjectState::Deleted).await
    }

    // ---- Content ----

    /// Fetch the content into memory.
    pub async fn content(&self) -> ObjectResult<Bytes> {
        Ok(self
            .api
            .a
            .datastream_content(&self.pid, &self.dsid, None)
            .await?)
    }

    /// Stream the content to a file.
    pub async fn content_to_file(&self, path: &Path) -> ObjectResult<()> {
        Ok(self
            .api
            .a
            .datastream_content_to_file(&self.pid, &self.dsid, None, path)
            .await?)
    }

    async fn set_content(&self, content: DatastreamContent) -> ObjectResult<()> {
        let group = self.control_group().await?;
        if group.requires_url() && !content.is_url() {
            return Err(ObjectError::BadArgument(format!(
                "control group {group} only accepts a URL content source"
            )));
        }
        if !group.requires_url() && content.is_url() {
            return Err(ObjectError::BadArgument(format!(
                "control group {group} stores a payload, not a URL"
            )));
        }
        let mime_type = self.mime_type().await?;
        self.modify(ModifyDatastreamOptions {
            content: Some(content),
            mime_type,
            ..Default::default()
        })
        .await
    }

    pub async fn set_content_from_bytes(&self, bytes: impl Into<Vec<u8>>) -> ObjectResult<()> {
        self.set_content(DatastreamContent::Bytes(bytes.into())).await
    }

    pub async fn set_content_from_string(&self, content: impl Into<String>) -> ObjectResult<()> {
        self.set_content_from_bytes(content.into().into_bytes()).await
    }

    pub async fn set_content_from_file(&self, path: impl Into<PathBuf>) -> ObjectResult<()> {
        self.set_content(DatastreamContent::File(path.into())).await
    }

    pub async fn set_content_from_url(&self, url: impl Into<String>) -> ObjectResult<()> {
        self.set_content(DatastreamContent::Url(url.into())).await
    }

    /// Profiles of every stored version, newest first.
    pub async fn history(&self) -> ApiResult<Vec<DatastreamProfile>> {
        self.api.m.datastream_history(&self.pid, &self.dsid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dor_api::DialectChoice;
    use dor_http::ReplayTransport;
    use std::sync::Arc;

    const DESCRIBE_V3: &str =
        "<fedoraRepository><repositoryVersion>3.8.1</repositoryVersion></fedoraRepository>";
    const PROFILE_REDIRECT: &str = "<datastreamProfile><dsState>A</dsState><dsControlGroup>R</dsControlGroup><dsLocation>http://example.org/old</dsLocation></datastreamProfile>";
    const PROFILE_MANAGED: &str = "<datastreamProfile><dsLabel>Object</dsLabel><dsState>A</dsState><dsControlGroup>M</dsControlGroup><dsMIME>application/pdf</dsMIME><dsSize>9</dsSize></datastreamProfile>";

    /// Profile fetches never consult the server version; only the tests
    /// that issue a modify queue the describe document.
    fn harness() -> (Arc<ReplayTransport>, RepositoryApi) {
        let transport = Arc::new(ReplayTransport::new());
        let api = RepositoryApi::new(transport.clone(), DialectChoice::Auto);
        (transport, api)
    }

    fn pid(s: &str) -> Pid {
        Pid::new(s).unwrap()
    }

    #[tokio::test]
    async fn profile_fetch_is_memoized() {
        let (transport, api) = harness();
        transport.push_ok("text/xml", PROFILE_MANAGED);
        let ds = Datastream::new(api, pid("test:1"), "OBJ".into());

        assert_eq!(ds.label().await.unwrap().as_deref(), Some("Object"));
        assert_eq!(ds.mime_type().await.unwrap().as_deref(), Some("application/pdf"));
        assert_eq!(ds.size().await.unwrap(), Some(9));
        // One profile fetch; the later reads hit the memo.
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn refresh_drops_memo() {
        let (transport, api) = harness();
        transport.push_ok("text/xml", PROFILE_MANAGED);
        transport.push_ok("text/xml", PROFILE_MANAGED);
        let ds = Datastream::new(api, pid("test:1"), "OBJ".into());

        ds.label().await.unwrap();
        ds.refresh().unwrap();
        ds.label().await.unwrap();
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn set_label_is_one_round_trip() {
        let (transport, api) = harness();
        transport.push_ok("text/xml", DESCRIBE_V3);
        transport.push_ok("text/xml", PROFILE_MANAGED);
        let ds = Datastream::new(api, pid("test:1"), "OBJ".into());

        ds.set_label("renamed").await.unwrap();
        let request = transport.request(1);
        assert_eq!(request.path, "/objects/test:1/datastreams/OBJ");
        assert_eq!(request.query_value("dsLabel"), Some("renamed"));
        assert_eq!(request.query_value("dsState"), None);
    }

    #[tokio::test]
    async fn redirect_content_must_be_url() {
        let (transport, api) = harness();
        transport.push_ok("text/xml", PROFILE_REDIRECT);
        let ds = Datastream::new(api, pid("test:1"), "LINK".into());

        let err = ds.set_content_from_file("/tmp/payload").await.unwrap_err();
        assert!(matches!(err, ObjectError::BadArgument(_)));
        // Only the profile fetch: the illegal write never went out.
        assert_eq!(transport.request_count(), 1);

        transport.push_ok("text/xml", DESCRIBE_V3);
        transport.push_ok("text/xml", PROFILE_REDIRECT);
        ds.set_content_from_url("http://example.org/new").await.unwrap();
        assert_eq!(
            transport.request(2).query_value("dsLocation"),
            Some("http://example.org/new")
        );
    }

    #[tokio::test]
    async fn managed_content_must_be_payload() {
        let (transport, api) = harness();
        transport.push_ok("text/xml", PROFILE_MANAGED);
        let ds = Datastream::new(api, pid("test:1"), "OBJ".into());

        let err = ds
            .set_content_from_url("http://example.org/x")
            .await
            .unwrap_err();
        assert!(matches!(err, ObjectError::BadArgument(_)));
    }

    #[tokio::test]
    async fn content_streams_to_file() {
        let (transport, api) = harness();
        transport.push_ok("application/pdf", &b"%PDF-1.4"[..]);
        let ds = Datastream::new(api, pid("test:1"), "OBJ".into());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OBJ.pdf");
        ds.content_to_file(&path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        let request = transport.request(0);
        assert_eq!(request.path, "/objects/test:1/datastreams/OBJ/content");
        assert!(request.download_to.is_some());
    }

    #[tokio::test]
    async fn delete_sets_state_deleted() {
        let (transport, api) = harness();
        transport.push_ok("text/xml", DESCRIBE_V3);
        transport.push_ok(
            "text/xml",
            "<datastreamProfile><dsState>D</dsState><dsControlGroup>M</dsControlGroup></datastreamProfile>",
        );
        let ds = Datastream::new(api, pid("test:1"), "OBJ".into());

        ds.delete().await.unwrap();
        assert_eq!(transport.request(1).query_value("dsState"), Some("D"));
        // The modify response refreshed the memo.
        assert_eq!(ds.state().await.unwrap(), ObjectState::Deleted);
        assert_eq!(transport.request_count(), 2);
    }
}
