//! Foundation types for the DOR repository client.
//!
//! This crate provides the identifier, state, and profile types shared by
//! every other DOR crate. Nothing here performs I/O: these are the plain
//! data shapes that the API binding parses remote documents into and the
//! facades hand back to callers.
//!
//! # Key Types
//!
//! - [`Pid`] — namespace-qualified persistent identifier of a digital object
//! - [`ObjectState`] / [`ControlGroup`] / [`ChecksumKind`] — wire enumerations
//! - [`ObjectProfile`] / [`DatastreamProfile`] — parsed metadata documents
//! - [`RepositoryInfo`] — the `/describe` document

pub mod checksum;
pub mod control;
pub mod error;
pub mod pid;
pub mod profile;
pub mod state;

pub use checksum::ChecksumKind;
pub use control::ControlGroup;
pub use error::TypeError;
pub use pid::Pid;
pub use profile::{
    DatastreamBrief, DatastreamProfile, ObjectProfile, RepositoryInfo, Validation,
};
pub use state::ObjectState;
