use crate::error::CacheResult;

/// Key-value memoization of fetched values.
///
/// Implementations must be cheap to clone values out of (callers store
/// `Arc`s) and must not perform I/O. `get` of an absent key is `Ok(None)`,
/// never an error.
pub trait Cache<V: Clone>: Send + Sync {
    /// Look up a cached value.
    fn get(&self, key: &str) -> CacheResult<Option<V>>;

    /// Insert or replace a cached value.
    fn set(&self, key: &str, value: V) -> CacheResult<()>;

    /// Remove a cached value. Returns `true` if the key was present.
    fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Number of cached entries.
    fn len(&self) -> CacheResult<usize>;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> CacheResult<bool> {
        Ok(self.len()? == 0)
    }
}
