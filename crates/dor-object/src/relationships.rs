//! Relationship editing against a persisted object.

use dor_api::{
    AddDatastreamOptions, ApiError, DatastreamContent, ModifyDatastreamOptions, RepositoryApi,
};
use dor_rels::{RelationshipDocument, Triple, TripleObject, RELATIONSHIP_DSID};
use dor_types::{ControlGroup, Pid};

use crate::error::{ObjectError, ObjectResult};

const RELS_MIME: &str = "application/rdf+xml";
const RELS_LABEL: &str = "Relationship Metadata";

/// Edits an object's relationship datastream.
///
/// Each mutation is read-modify-write: fetch the current document (an empty
/// one when the datastream does not exist yet), apply the change, and write
/// the serialized document back in one round trip.
pub struct RelationshipEditor {
    api: RepositoryApi,
    pid: Pid,
}

impl RelationshipEditor {
    pub(crate) fn new(api: RepositoryApi, pid: Pid) -> Self {
        Self { api, pid }
    }

    /// The current relationship document.
    pub async fn document(&self) -> ObjectResult<RelationshipDocument> {
        match self
            .api
            .a
            .datastream_content(&self.pid, RELATIONSHIP_DSID, None)
            .await
        {
            Ok(content) => {
                let xml = std::str::from_utf8(&content).map_err(|_| {
                    ObjectError::BadArgument(
                        "relationship datastream content is not UTF-8".into(),
                    )
                })?;
                Ok(RelationshipDocument::parse(xml)?)
            }
            Err(ApiError::NotFound(_)) => Ok(RelationshipDocument::new(&self.pid)),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, document: &RelationshipDocument, existed: bool) -> ObjectResult<()> {
        let content = DatastreamContent::Bytes(document.to_xml().into_bytes());
        if existed {
            self.api
                .m
                .modify_datastream(
                    &self.pid,
                    RELATIONSHIP_DSID,
                    ModifyDatastreamOptions {
                        content: Some(content),
                        mime_type: Some(RELS_MIME.into()),
                        ..Default::default()
                    },
                )
                .await?;
        } else {
            self.api
                .m
                .add_datastream(
                    &self.pid,
                    RELATIONSHIP_DSID,
                    content,
                    &AddDatastreamOptions {
                        control_group: Some(ControlGroup::InlineXml),
                        label: Some(RELS_LABEL.into()),
                        mime_type: Some(RELS_MIME.into()),
                        ..Default::default()
                    },
                )
                .await?;
        }
        Ok(())
    }

    async fn exists(&self) -> ObjectResult<bool> {
        let map = self.api.a.list_datastreams(&self.pid, None).await?;
        Ok(map.iter().any(|brief| brief.dsid == RELATIONSHIP_DSID))
    }

    /// Record one triple about the object.
    pub async fn add(
        &self,
        namespace: &str,
        name: &str,
        object: TripleObject,
    ) -> ObjectResult<()> {
        let existed = self.exists().await?;
        let mut document = if existed {
            self.document().await?
        } else {
            RelationshipDocument::new(&self.pid)
        };
        document.add(namespace, name, object);
        self.write(&document, existed).await
    }

    /// Triples matching the filters; `None` matches anything.
    pub async fn get(
        &self,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> ObjectResult<Vec<Triple>> {
        let document = self.document().await?;
        Ok(document
            .matching(namespace, name)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Remove matching triples and write the document back. Returns how
    /// many triples went away; zero means nothing was written.
    pub async fn remove(
        &self,
        namespace: Option<&str>,
        name: Option<&str>,
        object_value: Option<&str>,
    ) -> ObjectResult<usize> {
        let existed = self.exists().await?;
        if !existed {
            return Ok(0);
        }
        let mut document = self.document().await?;
        let removed = document.remove(namespace, name, object_value);
        if removed > 0 {
            self.write(&document, true).await?;
        }
        Ok(removed)
    }
}
