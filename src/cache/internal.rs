// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::sync::Arc;

use super::{CacheKey, ContentStore};
use crate::fingerprint::Fingerprint;
use crate::observability::messages::cache::{CacheReadFailed, CacheWriteFailed};
use crate::observability::messages::StructuredLog;
use crate::value::Value;

/// Component-private cache scoped to one step fingerprint.
///
/// Entries live in the `internal` namespace keyed by the component's own
/// sub-key. For an unhashable step every call is a no-op miss.
#[derive(Clone)]
pub struct InternalCache {
    store: Arc<dyn ContentStore>,
    fingerprint: Fingerprint,
    temp_dir: PathBuf,
}

impl InternalCache {
    pub fn new(store: Arc<dyn ContentStore>, fingerprint: Fingerprint, temp_dir: PathBuf) -> Self {
        Self {
            store,
            fingerprint,
            temp_dir,
        }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn has(&self, sub_key: &str) -> bool {
        CacheKey::internal(&self.fingerprint, sub_key)
            .map(|key| self.store.has(&key))
            .unwrap_or(false)
    }

    /// Read failures are reported as misses.
    pub fn get(&self, sub_key: &str) -> Option<Value> {
        let key = CacheKey::internal(&self.fingerprint, sub_key)?;
        match self.store.get(&key, &self.temp_dir) {
            Ok(value) => Some(value),
            Err(crate::errors::StoreError::NotFound) => None,
            Err(error) => {
                CacheReadFailed { key: &key, error: &error }.log();
                None
            }
        }
    }

    pub fn put(&self, sub_key: &str, value: &Value) {
        if let Some(key) = CacheKey::internal(&self.fingerprint, sub_key) {
            if let Err(error) = self.store.put(&key, value) {
                CacheWriteFailed { key: &key, error: &error }.log();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::value::TempArena;

    #[test]
    fn test_scoped_to_fingerprint() {
        let arena = TempArena::new(None).unwrap();
        let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
        let a = InternalCache::new(store.clone(), Fingerprint::Digest("aa".into()), arena.path().to_path_buf());
        let b = InternalCache::new(store.clone(), Fingerprint::Digest("bb".into()), arena.path().to_path_buf());

        a.put("partial", &Value::from("work"));
        assert_eq!(a.get("partial"), Some(Value::from("work")));
        assert!(!b.has("partial"));
        assert!(!store.has(&CacheKey::outputs(&Fingerprint::Digest("aa".into())).unwrap()));
    }

    #[test]
    fn test_unhashable_is_noop() {
        let arena = TempArena::new(None).unwrap();
        let store: Arc<dyn ContentStore> = Arc::new(MemoryStore::new());
        let cache = InternalCache::new(store, Fingerprint::Unhashable, arena.path().to_path_buf());
        cache.put("x", &Value::from("y"));
        assert!(!cache.has("x"));
        assert_eq!(cache.get("x"), None);
    }
}
