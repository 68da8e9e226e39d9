//! High-level client for DOR repositories.
//!
//! [`Repository`] is the entry point: it owns the API binding, a
//! process-local object cache, and the resource-index query helper, and
//! orchestrates the multi-call flows (ingest with datastream replay,
//! cache-fronted fetch, purge with eviction) that the lower crates
//! deliberately leave to one place.
//!
//! # Example
//!
//! ```no_run
//! use dor_client::{IdSpec, Repository, RepositoryConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RepositoryConfig::new("http://localhost:8080/fedora")
//!         .with_credentials("fedoraAdmin", "fedoraAdmin");
//!     let repo = Repository::connect(config)?;
//!
//!     let mut object = repo.construct_object(IdSpec::Namespace("demo".into()), false).await?;
//!     object.label = Some("Demo object".into());
//!     let persisted = repo.ingest_object(object).await?;
//!     println!("ingested {}", persisted.pid());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod ident;
pub mod repository;

pub use config::RepositoryConfig;
pub use error::{ClientError, ClientResult};
pub use ident::uuid_identifier;
pub use repository::{IdSpec, Repository};

pub use dor_api::{DialectChoice, RepositoryApi};
pub use dor_object::{Datastream, NewDatastream, NewObject, RepositoryObject};
pub use dor_query::{QueryLanguage, RepositoryQuery};
pub use dor_types::{
    ChecksumKind, ControlGroup, ObjectState, Pid, RepositoryInfo,
};
