// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use super::{CacheKey, ContentStore, JsonSerializer, Serializer};
use crate::errors::StoreError;
use crate::value::Value;

/// Separator between sanitized key components in a file name.
const KEY_SEPARATOR: &str = ".";

/// On-disk store: one file per key directly under `root`.
///
/// There is no index; an entry exists iff its file exists, so deleting any
/// file simply evicts that entry.
pub struct DirectoryStore {
    root: PathBuf,
    serializer: Arc<dyn Serializer>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_serializer(root, Arc::new(JsonSerializer))
    }

    pub fn with_serializer(root: impl Into<PathBuf>, serializer: Arc<dyn Serializer>) -> Self {
        Self {
            root: root.into(),
            serializer,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        let name: Vec<String> = key.components().map(sanitize).collect();
        self.root.join(name.join(KEY_SEPARATOR))
    }
}

/// Keeps `[A-Za-z0-9_-]` and percent-encodes every other byte, so the
/// separator never appears inside a component.
fn sanitize(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for byte in component.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

impl ContentStore for DirectoryStore {
    fn has(&self, key: &CacheKey) -> bool {
        self.path_for(key).is_file()
    }

    fn get(&self, key: &CacheKey, temp_dir: &Path) -> Result<Value, StoreError> {
        let bytes = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        Ok(self.serializer.load(&bytes, temp_dir)?)
    }

    fn put(&self, key: &CacheKey, value: &Value) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let bytes = match self.serializer.dump(value) {
            Ok(bytes) => bytes,
            Err(e) if e.is_unrepresentable() => {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        fs::create_dir_all(&self.root)?;
        let mut staged = NamedTempFile::new_in(&self.root)?;
        staged.write_all(&bytes)?;
        staged.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "directory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::value::{TempArena, TemporaryFile};

    fn key() -> CacheKey {
        CacheKey::internal(&Fingerprint::Digest("abc123".into()), "part/1.x").unwrap()
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("abc_D-9"), "abc_D-9");
        assert_eq!(sanitize("a.b/c"), "a%2Eb%2Fc");
    }

    #[test]
    fn test_path_is_deterministic() {
        let store = DirectoryStore::new("/cache");
        assert_eq!(
            store.path_for(&key()),
            PathBuf::from("/cache/abc123.internal.part%2F1%2Ex")
        );
    }

    #[test]
    fn test_put_get_across_instances() {
        let root = tempfile::tempdir().unwrap();
        let arena = TempArena::new(None).unwrap();

        DirectoryStore::new(root.path()).put(&key(), &Value::from("stored")).unwrap();

        let reopened = DirectoryStore::new(root.path());
        assert!(reopened.has(&key()));
        assert_eq!(reopened.get(&key(), arena.path()).unwrap(), Value::from("stored"));
    }

    #[test]
    fn test_temp_file_replays_into_new_arena() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());
        {
            let arena = TempArena::new(None).unwrap();
            let file = TemporaryFile::with_contents(arena.path(), Some(".bin"), b"\x00\x01payload").unwrap();
            store.put(&key(), &file.into()).unwrap();
        }

        let arena = TempArena::new(None).unwrap();
        let value = store.get(&key(), arena.path()).unwrap();
        let file = value.as_temp_file().unwrap();
        assert!(file.path().starts_with(arena.path()));
        assert_eq!(file.read().unwrap(), b"\x00\x01payload");
    }

    #[test]
    fn test_unrepresentable_put_leaves_no_file() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());
        store.put(&key(), &Value::from("old")).unwrap();

        store.put(&key(), &Value::opaque(1u8)).unwrap();
        assert!(!store.has(&key()));
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_and_corrupt_entries() {
        let root = tempfile::tempdir().unwrap();
        let arena = TempArena::new(None).unwrap();
        let store = DirectoryStore::new(root.path());
        assert!(matches!(store.get(&key(), arena.path()), Err(StoreError::NotFound)));

        fs::write(store.path_for(&key()), b"not json").unwrap();
        assert!(matches!(store.get(&key(), arena.path()), Err(StoreError::Serialize(_))));
    }
}
