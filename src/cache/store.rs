// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::Path;

use super::CacheKey;
use crate::errors::StoreError;
use crate::value::Value;

/// Key -> value store consulted before running a step.
///
/// Implementations must tolerate concurrent readers and concurrent writes of
/// the same key; two writers of one fingerprint write identical bytes.
pub trait ContentStore: Send + Sync {
    fn has(&self, key: &CacheKey) -> bool;

    /// Loads the entry under `key`. Temporary files embedded in the entry are
    /// recreated inside `temp_dir`.
    fn get(&self, key: &CacheKey, temp_dir: &Path) -> Result<Value, StoreError>;

    /// Stores `value` under `key`. A value the serializer cannot represent is
    /// skipped silently; callers must not assume the entry exists afterwards.
    fn put(&self, key: &CacheKey, value: &Value) -> Result<(), StoreError>;

    /// Short label for logs.
    fn kind(&self) -> &'static str;
}

/// Store used when caching is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl ContentStore for NullStore {
    fn has(&self, _key: &CacheKey) -> bool {
        false
    }

    fn get(&self, _key: &CacheKey, _temp_dir: &Path) -> Result<Value, StoreError> {
        Err(StoreError::NotFound)
    }

    fn put(&self, _key: &CacheKey, _value: &Value) -> Result<(), StoreError> {
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;

    #[test]
    fn test_null_store_never_holds_anything() {
        let store = NullStore;
        let key = CacheKey::outputs(&Fingerprint::Digest("ab".into())).unwrap();
        store.put(&key, &Value::from("x")).unwrap();
        assert!(!store.has(&key));
        assert!(matches!(
            store.get(&key, Path::new("/tmp")),
            Err(StoreError::NotFound)
        ));
    }
}
