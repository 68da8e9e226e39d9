//! REST API binding for the DOR repository client.
//!
//! The binding is split the way the remote interface is: [`ApiA`] carries
//! the read-oriented access calls (describe, profiles, listings, content
//! dissemination) and [`ApiM`] the write-oriented management calls (ingest,
//! modify, purge, relationships). [`RepositoryApi`] bundles both over one
//! shared transport.
//!
//! Every method maps to exactly one endpoint: required identifiers are
//! positional, everything optional arrives in an options struct, and an
//! option the caller never set is never sent. Responses pass through the
//! [`serializer`] into the typed shapes from `dor-types`.
//!
//! Servers of two generations are supported. The differences (which
//! endpoints exist, and whether documents come back as XML or JSON) are
//! resolved once per binding: [`ServerInfo`] is fetched and memoized on
//! first use, and call sites consult [`Capabilities`] instead of comparing
//! version numbers.

pub mod api_a;
pub mod api_m;
pub mod binding;
pub mod error;
pub mod options;
pub mod serializer;
pub mod version;

pub use api_a::ApiA;
pub use api_m::ApiM;
pub use binding::RepositoryApi;
pub use error::{ApiError, ApiResult};
pub use options::{
    AddDatastreamOptions, BatchDatastream, DatastreamContent, ExportOptions, FindObjectsOptions,
    FindObjectsResult, IngestBody, IngestOptions, ModifyDatastreamOptions, ModifyObjectOptions,
    ProfileQueryOptions, PurgeDatastreamOptions, SearchKind, SearchSession,
};
pub use version::{Capabilities, Dialect, DialectChoice, ServerInfo, ServerVersion};
