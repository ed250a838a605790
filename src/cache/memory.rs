// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use super::{CacheKey, ContentStore, JsonSerializer, Serializer};
use crate::errors::StoreError;
use crate::value::Value;

/// Process-lifetime store. Entries are kept serialized so temporary files are
/// replayed the same way the on-disk store replays them.
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, Vec<u8>>>,
    serializer: Arc<dyn Serializer>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_serializer(Arc::new(JsonSerializer))
    }

    pub fn with_serializer(serializer: Arc<dyn Serializer>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            serializer,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentStore for MemoryStore {
    fn has(&self, key: &CacheKey) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(key)
    }

    fn get(&self, key: &CacheKey, temp_dir: &Path) -> Result<Value, StoreError> {
        let bytes = {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            entries.get(key).cloned().ok_or(StoreError::NotFound)?
        };
        Ok(self.serializer.load(&bytes, temp_dir)?)
    }

    fn put(&self, key: &CacheKey, value: &Value) -> Result<(), StoreError> {
        let bytes = match self.serializer.dump(value) {
            Ok(bytes) => bytes,
            Err(e) if e.is_unrepresentable() => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.clone(), bytes);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::value::TempArena;

    fn key(hex: &str) -> CacheKey {
        CacheKey::outputs(&Fingerprint::Digest(hex.into())).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let arena = TempArena::new(None).unwrap();
        let store = MemoryStore::new();
        assert!(!store.has(&key("aa")));

        store.put(&key("aa"), &Value::from("hello")).unwrap();
        assert!(store.has(&key("aa")));
        assert!(!store.has(&key("bb")));
        assert_eq!(store.get(&key("aa"), arena.path()).unwrap(), Value::from("hello"));
        assert!(matches!(store.get(&key("bb"), arena.path()), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_unrepresentable_value_is_skipped() {
        let store = MemoryStore::new();
        store.put(&key("aa"), &Value::opaque(3u8)).unwrap();
        assert!(!store.has(&key("aa")));
        assert!(store.is_empty());
    }
}
