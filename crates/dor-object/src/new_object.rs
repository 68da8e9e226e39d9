//! Locally constructed, not-yet-ingested objects and datastreams.

use std::path::PathBuf;

use dor_api::DatastreamContent;
use dor_rels::{RelationshipDocument, Triple, TripleObject, RELATIONSHIP_DSID};
use dor_types::{ChecksumKind, ControlGroup, ObjectState, Pid};

use crate::error::{ObjectError, ObjectResult};

/// Pending content of a not-yet-ingested datastream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ContentSource {
    #[default]
    None,
    Bytes(Vec<u8>),
    File(PathBuf),
    Url(String),
}

impl ContentSource {
    /// The wire form of the pending content, if any was set.
    pub fn to_datastream_content(&self) -> Option<DatastreamContent> {
        match self {
            Self::None => None,
            Self::Bytes(bytes) => Some(DatastreamContent::Bytes(bytes.clone())),
            Self::File(path) => Some(DatastreamContent::File(path.clone())),
            Self::Url(url) => Some(DatastreamContent::Url(url.clone())),
        }
    }
}

/// A datastream that exists only locally until it is ingested.
///
/// The identifier and control group are fixed at construction; everything
/// else can be set freely before ingest. Content setters enforce the
/// control-group legality matrix.
#[derive(Clone, Debug)]
pub struct NewDatastream {
    id: String,
    control_group: ControlGroup,
    content: ContentSource,
    pub label: Option<String>,
    pub mime_type: Option<String>,
    pub versionable: Option<bool>,
    pub state: ObjectState,
    pub checksum_kind: Option<ChecksumKind>,
    pub format_uri: Option<String>,
}

impl NewDatastream {
    pub fn new(id: impl Into<String>, control_group: ControlGroup) -> Self {
        Self {
            id: id.into(),
            control_group,
            content: ContentSource::None,
            label: None,
            mime_type: None,
            versionable: None,
            state: ObjectState::Active,
            checksum_kind: None,
            format_uri: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn control_group(&self) -> ControlGroup {
        self.control_group
    }

    pub fn content(&self) -> &ContentSource {
        &self.content
    }

    /// Set pending content from a byte payload.
    pub fn set_content_from_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> ObjectResult<()> {
        self.check_payload_legal()?;
        self.content = ContentSource::Bytes(bytes.into());
        Ok(())
    }

    /// Set pending content from a string payload.
    pub fn set_content_from_string(&mut self, content: impl Into<String>) -> ObjectResult<()> {
        self.set_content_from_bytes(content.into().into_bytes())
    }

    /// Set pending content from a file on disk, read at ingest time.
    pub fn set_content_from_file(&mut self, path: impl Into<PathBuf>) -> ObjectResult<()> {
        self.check_payload_legal()?;
        self.content = ContentSource::File(path.into());
        Ok(())
    }

    /// Set pending content to a URL; the only legal source for redirect and
    /// external datastreams.
    pub fn set_content_from_url(&mut self, url: impl Into<String>) -> ObjectResult<()> {
        if !self.control_group.requires_url() {
            return Err(ObjectError::BadArgument(format!(
                "control group {} stores a payload, not a URL",
                self.control_group
            )));
        }
        self.content = ContentSource::Url(url.into());
        Ok(())
    }

    fn check_payload_legal(&self) -> ObjectResult<()> {
        if self.control_group.requires_url() {
            return Err(ObjectError::BadArgument(format!(
                "control group {} only accepts a URL content source",
                self.control_group
            )));
        }
        Ok(())
    }
}

/// An object that exists only locally until the repository ingests it.
///
/// Datastreams are kept in attachment order; ingest replays them in that
/// order.
#[derive(Clone, Debug)]
pub struct NewObject {
    pid: Pid,
    datastreams: Vec<NewDatastream>,
    pub label: Option<String>,
    pub owner: Option<String>,
    pub state: ObjectState,
    pub models: Vec<String>,
    pub log_message: Option<String>,
}

impl NewObject {
    pub fn new(pid: Pid) -> Self {
        Self {
            pid,
            datastreams: Vec::new(),
            label: None,
            owner: None,
            state: ObjectState::Active,
            models: Vec::new(),
            log_message: None,
        }
    }

    pub fn pid(&self) -> &Pid {
        &self.pid
    }

    /// Create a local datastream for this object. Not attached until
    /// [`ingest_datastream`](Self::ingest_datastream) is called.
    pub fn construct_datastream(
        &self,
        id: impl Into<String>,
        control_group: ControlGroup,
    ) -> NewDatastream {
        NewDatastream::new(id, control_group)
    }

    /// Attach a datastream. Identifiers are unique per object.
    pub fn ingest_datastream(&mut self, datastream: NewDatastream) -> ObjectResult<()> {
        if self.contains(datastream.id()) {
            return Err(ObjectError::DuplicateDatastream(datastream.id().to_string()));
        }
        self.datastreams.push(datastream);
        Ok(())
    }

    pub fn datastreams(&self) -> &[NewDatastream] {
        &self.datastreams
    }

    /// Consume the object, yielding its datastreams in attachment order.
    pub fn into_datastreams(self) -> Vec<NewDatastream> {
        self.datastreams
    }

    pub fn datastream(&self, id: &str) -> Option<&NewDatastream> {
        self.datastreams.iter().find(|ds| ds.id() == id)
    }

    fn datastream_mut(&mut self, id: &str) -> Option<&mut NewDatastream> {
        self.datastreams.iter_mut().find(|ds| ds.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.datastream(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.datastreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datastreams.is_empty()
    }

    // ---- Relationships on the pending relationship datastream ----

    fn rels_document(&self) -> ObjectResult<RelationshipDocument> {
        match self.datastream(RELATIONSHIP_DSID).map(NewDatastream::content) {
            Some(ContentSource::Bytes(bytes)) => {
                let xml = std::str::from_utf8(bytes).map_err(|_| {
                    ObjectError::BadArgument(
                        "relationship datastream content is not UTF-8".into(),
                    )
                })?;
                Ok(RelationshipDocument::parse(xml)?)
            }
            _ => Ok(RelationshipDocument::new(&self.pid)),
        }
    }

    fn write_rels_document(&mut self, document: &RelationshipDocument) -> ObjectResult<()> {
        let xml = document.to_xml();
        if self.datastream(RELATIONSHIP_DSID).is_none() {
            let mut ds = self.construct_datastream(RELATIONSHIP_DSID, ControlGroup::InlineXml);
            ds.label = Some("Relationship Metadata".into());
            ds.mime_type = Some("application/rdf+xml".into());
            self.ingest_datastream(ds)?;
        }
        let ds = self
            .datastream_mut(RELATIONSHIP_DSID)
            .expect("relationship datastream just ensured");
        ds.set_content_from_string(xml)
    }

    /// Record a relationship triple in the pending relationship datastream.
    pub fn add_relationship(
        &mut self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        object: TripleObject,
    ) -> ObjectResult<()> {
        let mut document = self.rels_document()?;
        document.add(namespace, name, object);
        self.write_rels_document(&document)
    }

    /// The pending relationship triples, optionally filtered.
    pub fn relationships(
        &self,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> ObjectResult<Vec<Triple>> {
        let document = self.rels_document()?;
        Ok(document
            .matching(namespace, name)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Remove pending relationship triples, returning how many went away.
    pub fn remove_relationship(
        &mut self,
        namespace: Option<&str>,
        name: Option<&str>,
        object_value: Option<&str>,
    ) -> ObjectResult<usize> {
        let mut document = self.rels_document()?;
        let removed = document.remove(namespace, name, object_value);
        if removed > 0 {
            self.write_rels_document(&document)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> Pid {
        Pid::new(s).unwrap()
    }

    #[test]
    fn redirect_rejects_file_accepts_url() {
        let object = NewObject::new(pid("test:1"));
        let mut ds = object.construct_datastream("REMOTE", ControlGroup::Redirect);

        let err = ds.set_content_from_file("/tmp/data.bin").unwrap_err();
        assert!(matches!(err, ObjectError::BadArgument(_)));
        assert_eq!(*ds.content(), ContentSource::None);

        ds.set_content_from_url("http://example.org/data.bin").unwrap();
        assert_eq!(
            *ds.content(),
            ContentSource::Url("http://example.org/data.bin".into())
        );
    }

    #[test]
    fn managed_rejects_url_accepts_payload() {
        let mut ds = NewDatastream::new("OBJ", ControlGroup::Managed);
        assert!(ds.set_content_from_url("http://example.org/x").is_err());
        ds.set_content_from_string("payload").unwrap();
        assert!(matches!(ds.content(), ContentSource::Bytes(_)));
    }

    #[test]
    fn duplicate_datastream_rejected() {
        let mut object = NewObject::new(pid("test:1"));
        object
            .ingest_datastream(NewDatastream::new("DC", ControlGroup::InlineXml))
            .unwrap();
        let err = object
            .ingest_datastream(NewDatastream::new("DC", ControlGroup::Managed))
            .unwrap_err();
        assert!(matches!(err, ObjectError::DuplicateDatastream(id) if id == "DC"));
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn attachment_order_is_preserved() {
        let mut object = NewObject::new(pid("test:1"));
        for id in ["DC", "OBJ", "TN"] {
            object
                .ingest_datastream(NewDatastream::new(id, ControlGroup::Managed))
                .unwrap();
        }
        let ids: Vec<&str> = object.datastreams().iter().map(|ds| ds.id()).collect();
        assert_eq!(ids, vec!["DC", "OBJ", "TN"]);
    }

    #[test]
    fn relationships_create_pending_datastream() {
        let mut object = NewObject::new(pid("test:test"));
        object
            .add_relationship(
                "http://example.org/rel#",
                "isViewableBy",
                TripleObject::literal("everyone"),
            )
            .unwrap();

        assert!(object.contains(RELATIONSHIP_DSID));
        let rels = object.relationships(None, None).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].object.value(), "everyone");
    }

    #[test]
    fn relationships_extend_existing_content() {
        let content = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://example.org/rel#">
  <rdf:Description rdf:about="info:fedora/test:test">
    <ex:woot>test</ex:woot>
  </rdf:Description>
</rdf:RDF>"#;
        let mut object = NewObject::new(pid("test:test"));
        let mut ds = object.construct_datastream(RELATIONSHIP_DSID, ControlGroup::InlineXml);
        ds.set_content_from_string(content).unwrap();
        object.ingest_datastream(ds).unwrap();

        object
            .add_relationship(
                "http://example.org/rel#",
                "woot",
                TripleObject::literal("1234"),
            )
            .unwrap();

        let rels = object.relationships(None, None).unwrap();
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].object.value(), "test");
        assert_eq!(rels[1].object.value(), "1234");
    }

    #[test]
    fn remove_relationship_rewrites_content() {
        let mut object = NewObject::new(pid("test:1"));
        object
            .add_relationship("http://example.org/#", "rel", TripleObject::literal("a"))
            .unwrap();
        object
            .add_relationship("http://example.org/#", "rel", TripleObject::literal("b"))
            .unwrap();

        let removed = object
            .remove_relationship(Some("http://example.org/#"), Some("rel"), Some("a"))
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(object.relationships(None, None).unwrap().len(), 1);
    }
}
