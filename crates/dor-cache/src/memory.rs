//! In-memory cache backing the repository facade.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{CacheError, CacheResult};
use crate::traits::Cache;

/// An unbounded in-memory [`Cache`].
///
/// All data lives in a `HashMap` behind a `RwLock` and is lost when the
/// cache is dropped. Suitable for the lifetime of one client process.
#[derive(Debug)]
pub struct MemoryCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> MemoryCache<V> {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Cache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> CacheResult<Option<V>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::LockPoisoned(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: V) -> CacheResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::LockPoisoned(e.to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| CacheError::LockPoisoned(e.to_string()))?;
        Ok(entries.remove(key).is_some())
    }

    fn len(&self) -> CacheResult<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| CacheError::LockPoisoned(e.to_string()))?;
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn get_absent_returns_none() {
        let cache: MemoryCache<String> = MemoryCache::new();
        assert!(cache.get("missing").unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let cache = MemoryCache::new();
        cache.set("test:1", "value".to_string()).unwrap();
        assert_eq!(cache.get("test:1").unwrap().unwrap(), "value");
    }

    #[test]
    fn set_replaces() {
        let cache = MemoryCache::new();
        cache.set("k", 1u32).unwrap();
        cache.set("k", 2u32).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some(2));
        assert_eq!(cache.len().unwrap(), 1);
    }

    #[test]
    fn delete_reports_presence() {
        let cache = MemoryCache::new();
        cache.set("k", 1u32).unwrap();
        assert!(cache.delete("k").unwrap());
        assert!(!cache.delete("k").unwrap());
        assert!(cache.is_empty().unwrap());
    }

    #[test]
    fn arc_values_share_identity() {
        let cache: MemoryCache<Arc<String>> = MemoryCache::new();
        let value = Arc::new("shared".to_string());
        cache.set("k", value.clone()).unwrap();
        let first = cache.get("k").unwrap().unwrap();
        let second = cache.get("k").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &value));
    }
}
