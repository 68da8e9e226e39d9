//! RDF relationship model for digital objects.
//!
//! An object's relationships live in a dedicated datastream as an RDF/XML
//! document: one `rdf:Description` about the object's resource URI, with one
//! child element per triple. This crate owns that document shape.
//! [`RelationshipDocument`] parses it, edits it, and serializes it back,
//! without knowing anything about HTTP or datastreams; the facade layer
//! wires mutations to the remote side.

pub mod document;
pub mod error;
pub mod triple;

pub use document::RelationshipDocument;
pub use error::{RelsError, RelsResult};
pub use triple::{Predicate, Triple, TripleObject};

/// Datastream identifier conventionally holding an object's relationships.
pub const RELATIONSHIP_DSID: &str = "RELS-EXT";

/// The RDF syntax namespace.
pub const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
