//! The persisted-object facade.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use dor_api::{AddDatastreamOptions, ModifyObjectOptions, PurgeDatastreamOptions, RepositoryApi};
use dor_types::{ControlGroup, ObjectProfile, ObjectState, Pid};

use crate::datastream::Datastream;
use crate::error::{ObjectError, ObjectResult};
use crate::new_object::NewDatastream;
use crate::relationships::RelationshipEditor;

/// An object that exists in the repository.
///
/// Opening the facade verifies the identifier remotely (a missing id is
/// [`NotFound`](dor_api::ApiError::NotFound)). The profile and the
/// datastream map are memoized on the facade; property writes are one
/// immediate modify round trip each.
pub struct RepositoryObject {
    pid: Pid,
    api: RepositoryApi,
    profile: RwLock<Option<ObjectProfile>>,
    datastreams: RwLock<Option<BTreeMap<String, Arc<Datastream>>>>,
}

impl std::fmt::Debug for RepositoryObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryObject")
            .field("pid", &self.pid)
            .finish_non_exhaustive()
    }
}

impl RepositoryObject {
    /// Open an existing object, verifying it exists remotely.
    pub async fn open(api: RepositoryApi, pid: Pid) -> ObjectResult<Arc<Self>> {
        let profile = api.a.object_profile(&pid, None).await?;
        debug!(pid = %pid, "opened repository object");
        Ok(Arc::new(Self {
            pid,
            api,
            profile: RwLock::new(Some(profile)),
            datastreams: RwLock::new(None),
        }))
    }

    /// Wrap an identifier known to exist (fresh from an ingest) without a
    /// verification round trip. Reads against a wrong identifier surface
    /// remote errors on first fetch instead.
    pub fn attach(api: RepositoryApi, pid: Pid) -> Arc<Self> {
        Arc::new(Self {
            pid,
            api,
            profile: RwLock::new(None),
            datastreams: RwLock::new(None),
        })
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// The memoized profile, fetching it on first use.
    pub async fn profile(&self) -> ObjectResult<ObjectProfile> {
        if let Some(profile) = self
            .profile
            .read()
            .map_err(|_| ObjectError::LockPoisoned)?
            .clone()
        {
            return Ok(profile);
        }
        let fetched = self.api.a.object_profile(&self.pid, None).await?;
        self.store_profile(fetched.clone())?;
        Ok(fetched)
    }

    /// Drop the profile and datastream memos; the next reads re-fetch.
    pub fn refresh(&self) -> ObjectResult<()> {
        *self.profile.write().map_err(|_| ObjectError::LockPoisoned)? = None;
        *self
            .datastreams
            .write()
            .map_err(|_| ObjectError::LockPoisoned)? = None;
        Ok(())
    }

    fn store_profile(&self, profile: ObjectProfile) -> ObjectResult<()> {
        *self.profile.write().map_err(|_| ObjectError::LockPoisoned)? = Some(profile);
        Ok(())
    }

    // ---- Accessors ----

    pub async fn label(&self) -> ObjectResult<Option<String>> {
        Ok(self.profile().await?.label)
    }

    pub async fn owner(&self) -> ObjectResult<Option<String>> {
        Ok(self.profile().await?.owner)
    }

    pub async fn state(&self) -> ObjectResult<ObjectState> {
        Ok(self.profile().await?.state)
    }

    pub async fn created(&self) -> ObjectResult<Option<DateTime<Utc>>> {
        Ok(self.profile().await?.created)
    }

    pub async fn modified(&self) -> ObjectResult<Option<DateTime<Utc>>> {
        Ok(self.profile().await?.modified)
    }

    pub async fn models(&self) -> ObjectResult<Vec<String>> {
        Ok(self.profile().await?.models)
    }

    // ---- Mutators: one modify round trip each ----

    async fn modify(&self, options: ModifyObjectOptions) -> ObjectResult<()> {
        self.api.m.modify_object(&self.pid, &options).await?;
        // The modify response is only a timestamp; patch the memo in place
        // rather than re-fetching.
        let mut guard = self.profile.write().map_err(|_| ObjectError::LockPoisoned)?;
        if let Some(profile) = guard.as_mut() {
            if let Some(label) = options.label {
                profile.label = Some(label);
            }
            if let Some(owner) = options.owner {
                profile.owner = Some(owner);
            }
            if let Some(state) = options.state {
                profile.state = state;
            }
        }
        Ok(())
    }

    pub async fn set_label(&self, label: impl Into<String>) -> ObjectResult<()> {
        self.modify(ModifyObjectOptions {
            label: Some(label.into()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_owner(&self, owner: impl Into<String>) -> ObjectResult<()> {
        self.modify(ModifyObjectOptions {
            owner: Some(owner.into()),
            ..Default::default()
        })
        .await
    }

    pub async fn set_state(&self, state: ObjectState) -> ObjectResult<()> {
        self.modify(ModifyObjectOptions {
            state: Some(state),
            ..Default::default()
        })
        .await
    }

    /// Set the state to deleted. The object stays in the repository (and in
    /// any local cache) until purged.
    pub async fn delete(&self) -> ObjectResult<()> {
        self.set_state(ObjectState::Deleted).await
    }

    // ---- Datastreams ----

    async fn datastream_map(&self) -> ObjectResult<BTreeMap<String, Arc<Datastream>>> {
        if let Some(map) = self
            .datastreams
            .read()
            .map_err(|_| ObjectError::LockPoisoned)?
            .clone()
        {
            return Ok(map);
        }
        let listed = self.api.a.list_datastreams(&self.pid, None).await?;
        let map: BTreeMap<String, Arc<Datastream>> = listed
            .into_iter()
            .map(|brief| {
                let ds = Arc::new(Datastream::new(
                    self.api.clone(),
                    self.pid.clone(),
                    brief.dsid.clone(),
                ));
                (brief.dsid, ds)
            })
            .collect();
        *self
            .datastreams
            .write()
            .map_err(|_| ObjectError::LockPoisoned)? = Some(map.clone());
        Ok(map)
    }

    /// All datastreams, keyed and ordered by identifier.
    pub async fn datastreams(&self) -> ObjectResult<Vec<Arc<Datastream>>> {
        Ok(self.datastream_map().await?.into_values().collect())
    }

    /// Look up one datastream by identifier.
    pub async fn datastream(&self, id: &str) -> ObjectResult<Option<Arc<Datastream>>> {
        Ok(self.datastream_map().await?.get(id).cloned())
    }

    pub async fn contains(&self, id: &str) -> ObjectResult<bool> {
        Ok(self.datastream_map().await?.contains_key(id))
    }

    pub async fn len(&self) -> ObjectResult<usize> {
        Ok(self.datastream_map().await?.len())
    }

    pub async fn is_empty(&self) -> ObjectResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Create a local datastream for this object. Nothing is sent until
    /// [`ingest_datastream`](Self::ingest_datastream).
    pub fn construct_datastream(
        &self,
        id: impl Into<String>,
        control_group: ControlGroup,
    ) -> NewDatastream {
        NewDatastream::new(id, control_group)
    }

    /// Persist a locally constructed datastream: one add round trip, after
    /// which the datastream is visible in iteration.
    pub async fn ingest_datastream(
        &self,
        datastream: NewDatastream,
    ) -> ObjectResult<Arc<Datastream>> {
        let map = self.datastream_map().await?;
        if map.contains_key(datastream.id()) {
            return Err(ObjectError::DuplicateDatastream(datastream.id().to_string()));
        }
        let content = datastream.content().to_datastream_content().ok_or_else(|| {
            ObjectError::BadArgument(format!(
                "datastream {} has no content to ingest",
                datastream.id()
            ))
        })?;
        let options = AddDatastreamOptions {
            control_group: Some(datastream.control_group()),
            label: datastream.label.clone(),
            versionable: datastream.versionable,
            state: Some(datastream.state),
            checksum_kind: datastream.checksum_kind,
            format_uri: datastream.format_uri.clone(),
            mime_type: datastream.mime_type.clone(),
            ..Default::default()
        };
        let profile = self
            .api
            .m
            .add_datastream(&self.pid, datastream.id(), content, &options)
            .await?;

        let persisted = Arc::new(Datastream::with_profile(
            self.api.clone(),
            self.pid.clone(),
            datastream.id().to_string(),
            profile,
        ));
        let mut guard = self
            .datastreams
            .write()
            .map_err(|_| ObjectError::LockPoisoned)?;
        if let Some(map) = guard.as_mut() {
            map.insert(datastream.id().to_string(), Arc::clone(&persisted));
        }
        Ok(persisted)
    }

    /// Purge a datastream permanently. Returns the purged version
    /// timestamps.
    pub async fn purge_datastream(&self, id: &str) -> ObjectResult<Vec<String>> {
        let purged = self
            .api
            .m
            .purge_datastream(&self.pid, id, &PurgeDatastreamOptions::default())
            .await?;
        let mut guard = self
            .datastreams
            .write()
            .map_err(|_| ObjectError::LockPoisoned)?;
        if let Some(map) = guard.as_mut() {
            map.remove(id);
        }
        Ok(purged)
    }

    /// Edit this object's relationship datastream.
    pub fn relationships(&self) -> RelationshipEditor {
        RelationshipEditor::new(self.api.clone(), self.pid.clone())
    }
}
