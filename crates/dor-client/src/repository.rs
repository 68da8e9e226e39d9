//! The cache-fronted repository accessor.

use std::sync::Arc;

use tracing::{debug, info};

use dor_api::{
    BatchDatastream, Dialect, IngestOptions, ModifyObjectOptions, RepositoryApi,
};
use dor_cache::{Cache, MemoryCache};
use dor_object::{NewDatastream, NewObject, RepositoryObject};
use dor_query::RepositoryQuery;
use dor_rels::{Predicate, Triple, TripleObject};
use dor_types::{ObjectState, Pid, RepositoryInfo};

use crate::config::RepositoryConfig;
use crate::error::{ClientError, ClientResult};
use crate::ident::uuid_identifier;

/// Predicate recording an object's content models.
const MODEL_NAMESPACE: &str = "info:fedora/fedora-system:def/model#";
const HAS_MODEL: &str = "hasModel";

/// How the caller names a new object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdSpec {
    /// Mint an identifier in the repository's default namespace.
    Auto,
    /// Mint an identifier in this namespace.
    Namespace(String),
    /// Use exactly this identifier.
    Full(Pid),
}

impl IdSpec {
    /// Interpret an optional user-supplied string the way the facade
    /// documents it: absent means auto, a bare word is a namespace, and a
    /// qualified identifier is used as given.
    pub fn parse(spec: Option<&str>) -> ClientResult<Self> {
        match spec {
            None | Some("") => Ok(Self::Auto),
            Some(s) if s.contains(':') => Ok(Self::Full(Pid::new(s)?)),
            Some(s) => Ok(Self::Namespace(s.to_string())),
        }
    }
}

/// Factory and cache-fronted accessor for repository objects.
///
/// One `Repository` owns one API binding and one object cache. Fetched
/// objects are memoized per identifier: repeated lookups return the same
/// `Arc` without touching the network, until the object is purged.
pub struct Repository {
    api: RepositoryApi,
    query: RepositoryQuery,
    cache: MemoryCache<Arc<RepositoryObject>>,
    default_namespace: Option<String>,
}

impl Repository {
    /// Build a repository over an existing binding.
    pub fn new(api: RepositoryApi, default_namespace: Option<String>) -> Self {
        let query = RepositoryQuery::new(api.transport());
        Self {
            api,
            query,
            cache: MemoryCache::new(),
            default_namespace,
        }
    }

    /// Connect to a repository described by a configuration.
    pub fn connect(config: RepositoryConfig) -> ClientResult<Self> {
        let api = RepositoryApi::connect(config.connection, config.dialect)?;
        Ok(Self::new(api, config.default_namespace))
    }

    /// The raw API binding.
    pub fn api(&self) -> &RepositoryApi {
        &self.api
    }

    /// The resource-index query helper.
    pub fn query(&self) -> &RepositoryQuery {
        &self.query
    }

    /// Describe the remote repository.
    pub async fn describe(&self) -> ClientResult<RepositoryInfo> {
        Ok(self.api.a.describe_repository().await?)
    }

    async fn resolve_namespace(&self, namespace: Option<&str>) -> ClientResult<String> {
        if let Some(ns) = namespace {
            return Ok(ns.to_string());
        }
        if let Some(ns) = &self.default_namespace {
            return Ok(ns.clone());
        }
        let described = self.api.a.describe_repository().await?;
        described.pid_namespace.ok_or_else(|| {
            ClientError::BadArgument(
                "no namespace given and the server reports no default".into(),
            )
        })
    }

    /// Allocate unused identifiers: minted locally as v4 UUIDs, or asked of
    /// the server.
    pub async fn next_identifiers(
        &self,
        namespace: Option<&str>,
        use_uuid: bool,
        count: u32,
    ) -> ClientResult<Vec<Pid>> {
        if count == 0 {
            return Err(ClientError::BadArgument(
                "asked for zero identifiers".into(),
            ));
        }
        if use_uuid {
            let namespace = self.resolve_namespace(namespace).await?;
            return (0..count).map(|_| uuid_identifier(&namespace)).collect();
        }
        Ok(self.api.m.next_pid(namespace, Some(count)).await?)
    }

    /// Create a local, un-ingested object under the requested identifier.
    pub async fn construct_object(&self, spec: IdSpec, use_uuid: bool) -> ClientResult<NewObject> {
        let pid = match spec {
            IdSpec::Full(pid) => pid,
            IdSpec::Namespace(ns) => self
                .next_identifiers(Some(&ns), use_uuid, 1)
                .await?
                .remove(0),
            IdSpec::Auto => self.next_identifiers(None, use_uuid, 1).await?.remove(0),
        };
        Ok(NewObject::new(pid))
    }

    /// Ingest a locally constructed object.
    ///
    /// One create call, then the object-level property copy, then the
    /// datastream replay in attachment order: batched into a single atomic
    /// multi-add call when the server supports it, one add call per
    /// datastream otherwise. Redirect and external datastreams always send
    /// their URL, never fetched content.
    ///
    /// The local object is consumed; the returned facade is the persisted
    /// object, registered in the cache.
    pub async fn ingest_object(&self, object: NewObject) -> ClientResult<Arc<RepositoryObject>> {
        let info = self.api.server_info().await?;
        let pid = self
            .api
            .m
            .ingest(IngestOptions {
                pid: Some(object.pid().clone()),
                label: object.label.clone(),
                log_message: object.log_message.clone(),
                ..Default::default()
            })
            .await?;
        debug!(pid = %pid, datastreams = object.len(), "created object, replaying datastreams");

        // Object-level property copy. Owner and model copy only works
        // against generation-3 servers; the newer backend pins both at
        // creation time, so they are deliberately skipped there.
        let legacy = info.dialect == Dialect::XmlV3;
        let copy = ModifyObjectOptions {
            state: (object.state != ObjectState::Active).then_some(object.state),
            owner: if legacy { object.owner.clone() } else { None },
            ..Default::default()
        };
        if !copy.is_empty() {
            self.api.m.modify_object(&pid, &copy).await?;
        }
        if legacy {
            for model in &object.models {
                let triple = Triple::new(
                    Predicate::new(MODEL_NAMESPACE, HAS_MODEL),
                    TripleObject::resource(model.clone()),
                );
                self.api.m.add_relationship(&pid, &triple).await?;
            }
        }

        let datastreams = object.into_datastreams();
        if info.capabilities.batch_datastream_add {
            let batch = datastreams
                .iter()
                .map(|ds| batch_entry(ds))
                .collect::<ClientResult<Vec<_>>>()?;
            if !batch.is_empty() {
                self.api.m.add_datastreams(&pid, batch).await?;
            }
        } else {
            for ds in &datastreams {
                let content = ds.content().to_datastream_content().ok_or_else(|| {
                    ClientError::BadArgument(format!(
                        "datastream {} has no content to ingest",
                        ds.id()
                    ))
                })?;
                let options = dor_api::AddDatastreamOptions {
                    control_group: Some(ds.control_group()),
                    label: ds.label.clone(),
                    versionable: ds.versionable,
                    state: Some(ds.state),
                    checksum_kind: ds.checksum_kind,
                    format_uri: ds.format_uri.clone(),
                    mime_type: ds.mime_type.clone(),
                    ..Default::default()
                };
                self.api
                    .m
                    .add_datastream(&pid, ds.id(), content, &options)
                    .await?;
            }
        }

        let persisted = RepositoryObject::attach(self.api.clone(), pid.clone());
        self.cache.set(pid.as_str(), Arc::clone(&persisted))?;
        info!(pid = %pid, "ingested object");
        Ok(persisted)
    }

    /// Fetch an object, memoizing it. A cache hit returns the same
    /// instance with no network round trip; a miss verifies the identifier
    /// remotely and fails with `NotFound` when it does not exist.
    pub async fn get_object(&self, pid: &Pid) -> ClientResult<Arc<RepositoryObject>> {
        if let Some(cached) = self.cache.get(pid.as_str())? {
            return Ok(cached);
        }
        let object = RepositoryObject::open(self.api.clone(), pid.clone()).await?;
        self.cache.set(pid.as_str(), Arc::clone(&object))?;
        Ok(object)
    }

    /// Purge an object permanently and evict it from the cache. Terminal:
    /// a subsequent fetch of the identifier goes back to the server and
    /// fails with `NotFound` once the object is gone.
    pub async fn purge_object(&self, pid: &Pid) -> ClientResult<String> {
        let timestamp = self.api.m.purge_object(pid, None).await?;
        self.cache.delete(pid.as_str())?;
        info!(pid = %pid, "purged object");
        Ok(timestamp)
    }

    /// Number of memoized objects.
    pub fn cached_objects(&self) -> ClientResult<usize> {
        Ok(self.cache.len()?)
    }
}

fn batch_entry(ds: &NewDatastream) -> ClientResult<BatchDatastream> {
    let content = ds.content().to_datastream_content().ok_or_else(|| {
        ClientError::BadArgument(format!("datastream {} has no content to ingest", ds.id()))
    })?;
    Ok(BatchDatastream {
        dsid: ds.id().to_string(),
        control_group: ds.control_group(),
        content,
        mime_type: ds.mime_type.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dor_api::{ApiError, DialectChoice};
    use dor_http::{Method, MultipartField, ReplayTransport, RequestBody};
    use dor_types::ControlGroup;

    const DESCRIBE_V3: &str = "<fedoraRepository><repositoryVersion>3.8.1</repositoryVersion><repositoryPID><PID-namespaceIdentifier>changeme</PID-namespaceIdentifier></repositoryPID></fedoraRepository>";
    const DESCRIBE_V4: &str = r#"{"repositoryVersion": "4.0.0"}"#;
    const OBJECT_PROFILE: &str =
        "<objectProfile><objLabel>Thing</objLabel><objState>A</objState></objectProfile>";
    const DS_PROFILE: &str = "<datastreamProfile><dsState>A</dsState><dsControlGroup>M</dsControlGroup></datastreamProfile>";

    fn v3_repo(transport: &Arc<ReplayTransport>) -> Repository {
        transport.push_ok("text/xml", DESCRIBE_V3);
        let api = RepositoryApi::new(transport.clone(), DialectChoice::Auto);
        Repository::new(api, None)
    }

    fn v4_repo(transport: &Arc<ReplayTransport>) -> Repository {
        transport.push_ok("application/json", DESCRIBE_V4);
        let api = RepositoryApi::new(transport.clone(), DialectChoice::Auto);
        Repository::new(api, None)
    }

    fn pid(s: &str) -> Pid {
        Pid::new(s).unwrap()
    }

    /// A new object with the three content flavors attached.
    fn three_stream_object(pid_str: &str) -> NewObject {
        let mut object = NewObject::new(pid(pid_str));
        let mut dc = object.construct_datastream("DC", ControlGroup::InlineXml);
        dc.set_content_from_string("<dc/>").unwrap();
        object.ingest_datastream(dc).unwrap();
        let mut obj = object.construct_datastream("OBJ", ControlGroup::Managed);
        obj.set_content_from_bytes(b"%PDF-1.4".to_vec()).unwrap();
        object.ingest_datastream(obj).unwrap();
        let mut remote = object.construct_datastream("REMOTE", ControlGroup::External);
        remote
            .set_content_from_url("http://example.org/data.bin")
            .unwrap();
        object.ingest_datastream(remote).unwrap();
        object
    }

    #[tokio::test]
    async fn get_object_memoizes_instances() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_ok("text/xml", OBJECT_PROFILE);

        let id = pid("test:1");
        let first = repo.get_object(&id).await.unwrap();
        let requests_after_first = transport.request_count();
        let second = repo.get_object(&id).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        // The second lookup issued no request at all.
        assert_eq!(transport.request_count(), requests_after_first);
    }

    #[tokio::test]
    async fn get_missing_object_is_not_found() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_status(404);

        let err = repo.get_object(&pid("test:gone")).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Object(dor_object::ObjectError::Api(ApiError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn ingest_v3_replays_streams_one_by_one() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_ok("text/plain", "test:1"); // create
        transport.push_ok("text/xml", DS_PROFILE); // DC
        transport.push_ok("text/xml", DS_PROFILE); // OBJ
        transport.push_ok("text/xml", DS_PROFILE); // REMOTE

        let persisted = repo.ingest_object(three_stream_object("test:1")).await.unwrap();
        assert_eq!(persisted.pid().as_str(), "test:1");

        // describe, create, then exactly one add per datastream in order.
        assert_eq!(transport.request_count(), 5);
        let create = transport.request(1);
        assert_eq!(create.path, "/objects/test:1");
        assert_eq!(create.method(), Method::Post);

        assert_eq!(transport.request(2).path, "/objects/test:1/datastreams/DC");
        assert_eq!(transport.request(3).path, "/objects/test:1/datastreams/OBJ");
        let remote = transport.request(4);
        assert_eq!(remote.path, "/objects/test:1/datastreams/REMOTE");
        // The external stream ships its URL, never fetched content.
        assert_eq!(
            remote.query_value("dsLocation"),
            Some("http://example.org/data.bin")
        );
        assert_eq!(remote.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn ingest_v4_uses_one_batched_call() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v4_repo(&transport);
        transport.push_ok("text/plain", "test:1"); // create
        transport.push_ok("text/plain", ""); // batch add

        repo.ingest_object(three_stream_object("test:1")).await.unwrap();

        // describe, create, one batch call. No per-stream adds.
        assert_eq!(transport.request_count(), 3);
        let batch = transport.request(2);
        assert_eq!(batch.path, "/objects/test:1/datastreams");
        match &batch.body {
            RequestBody::Multipart(fields) => {
                assert_eq!(fields.len(), 3);
                assert_eq!(fields[0].name(), "DC");
                assert_eq!(fields[1].name(), "OBJ");
                assert!(matches!(
                    &fields[2],
                    MultipartField::Text { value, .. } if value == "http://example.org/data.bin"
                ));
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ingest_copies_owner_on_legacy_only() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_ok("text/plain", "test:1"); // create
        transport.push_ok("text/plain", "2012-01-01T00:00:00.000Z"); // modify

        let mut object = NewObject::new(pid("test:1"));
        object.owner = Some("fedoraAdmin".into());
        repo.ingest_object(object).await.unwrap();

        let modify = transport.request(2);
        assert_eq!(modify.method(), Method::Put);
        assert_eq!(modify.query_value("ownerId"), Some("fedoraAdmin"));

        // The newer backend pins the owner at creation: no modify call.
        let transport = Arc::new(ReplayTransport::new());
        let repo = v4_repo(&transport);
        transport.push_ok("text/plain", "test:2"); // create

        let mut object = NewObject::new(pid("test:2"));
        object.owner = Some("fedoraAdmin".into());
        repo.ingest_object(object).await.unwrap();
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn ingest_records_models_via_relationships_on_legacy() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_ok("text/plain", "test:1"); // create
        transport.push_ok("text/plain", ""); // relationship add

        let mut object = NewObject::new(pid("test:1"));
        object.models = vec!["info:fedora/islandora:collectionCModel".into()];
        repo.ingest_object(object).await.unwrap();

        let rel = transport.request(2);
        assert_eq!(rel.path, "/objects/test:1/relationships/new");
        assert_eq!(
            rel.query_value("predicate"),
            Some("info:fedora/fedora-system:def/model#hasModel")
        );
        assert_eq!(
            rel.query_value("object"),
            Some("info:fedora/islandora:collectionCModel")
        );
        assert_eq!(rel.query_value("isLiteral"), Some("false"));
    }

    #[tokio::test]
    async fn ingested_object_is_cached() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_ok("text/plain", "test:1");

        let persisted = repo.ingest_object(NewObject::new(pid("test:1"))).await.unwrap();
        let requests = transport.request_count();

        let fetched = repo.get_object(&pid("test:1")).await.unwrap();
        assert!(Arc::ptr_eq(&persisted, &fetched));
        assert_eq!(transport.request_count(), requests);
    }

    #[tokio::test]
    async fn purge_evicts_and_later_get_goes_remote() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        transport.push_ok("text/xml", OBJECT_PROFILE);

        let id = pid("test:1");
        repo.get_object(&id).await.unwrap();
        assert_eq!(repo.cached_objects().unwrap(), 1);

        transport.push_ok("text/plain", "2012-03-08T18:44:15.214Z");
        repo.purge_object(&id).await.unwrap();
        assert_eq!(repo.cached_objects().unwrap(), 0);

        // The next fetch is a fresh network request and maps the remote
        // 404 to NotFound.
        transport.push_status(404);
        let err = repo.get_object(&id).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Object(dor_object::ObjectError::Api(ApiError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn construct_object_with_full_id_is_local() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);

        let object = repo
            .construct_object(IdSpec::Full(pid("test:42")), false)
            .await
            .unwrap();
        assert_eq!(object.pid().as_str(), "test:42");
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn construct_object_in_namespace_asks_server() {
        // next_pid never consults the server version, so no describe
        // document is queued here.
        let transport = Arc::new(ReplayTransport::new());
        let repo = Repository::new(
            RepositoryApi::new(transport.clone(), DialectChoice::Auto),
            None,
        );
        transport.push_ok("text/xml", "<pidList><pid>demo:7</pid></pidList>");

        let object = repo
            .construct_object(IdSpec::Namespace("demo".into()), false)
            .await
            .unwrap();
        assert_eq!(object.pid().as_str(), "demo:7");
        let request = transport.request(0);
        assert_eq!(request.path, "/nextPID");
        assert_eq!(request.query_value("namespace"), Some("demo"));
    }

    #[tokio::test]
    async fn construct_object_with_uuid_stays_local() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);

        let object = repo
            .construct_object(IdSpec::Namespace("demo".into()), true)
            .await
            .unwrap();
        assert_eq!(object.pid().namespace(), "demo");
        assert_eq!(object.pid().local_id().len(), 36);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn auto_uuid_resolves_server_default_namespace() {
        let transport = Arc::new(ReplayTransport::new());
        let repo = v3_repo(&transport);
        // resolve_namespace falls back to the describe document.
        let described = transport.request_count();
        assert_eq!(described, 0);

        let pids = repo.next_identifiers(None, true, 2).await.unwrap();
        assert_eq!(pids.len(), 2);
        assert!(pids.iter().all(|p| p.namespace() == "changeme"));
        assert_ne!(pids[0], pids[1]);
    }

    #[test]
    fn id_spec_parsing() {
        assert_eq!(IdSpec::parse(None).unwrap(), IdSpec::Auto);
        assert_eq!(
            IdSpec::parse(Some("demo")).unwrap(),
            IdSpec::Namespace("demo".into())
        );
        assert_eq!(
            IdSpec::parse(Some("demo:1")).unwrap(),
            IdSpec::Full(pid("demo:1"))
        );
        assert!(IdSpec::parse(Some(":bad")).is_err());
    }
}
