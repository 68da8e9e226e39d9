//! Resource-index queries against the repository's query endpoints.
//!
//! [`RepositoryQuery`] issues SPARQL and iTQL queries against the resource
//! index and JCR-SQL2 queries against the JCR endpoint, flattening both
//! result formats into the same shape: an ordered list of rows mapping each
//! query variable to a [`QueryValue`]. Resource URIs under the repository's
//! reserved prefix are stripped in `value` (so they read as bare pids) and
//! preserved in full in `uri`.

pub mod error;
pub mod query;
pub mod results;

pub use error::{QueryError, QueryResult};
pub use query::{QueryLanguage, RepositoryQuery};
pub use results::{QueryRow, QueryValue, ValueKind};
