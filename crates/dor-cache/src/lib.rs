//! Process-local memoization for already-fetched repository objects.
//!
//! The repository facade uses a [`Cache`] to hand back the same instance for
//! repeated lookups of one identifier instead of re-fetching it. The only
//! shipped implementation is [`MemoryCache`]: an unbounded map that lives as
//! long as the process. There is no eviction policy; `delete` is called
//! explicitly when an object is purged.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryCache;
pub use traits::Cache;
