// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::errors::SerializeError;
use crate::fingerprint::Fingerprint;
use crate::value::{TemporaryFile, Value};

/// Deterministic value <-> bytes mapping shared by hashing and storage.
pub trait Serializer: Send + Sync {
    fn dump(&self, value: &Value) -> Result<Vec<u8>, SerializeError>;

    /// Decodes `bytes`, recreating any embedded temporary file inside
    /// `temp_dir`.
    fn load(&self, bytes: &[u8], temp_dir: &Path) -> Result<Value, SerializeError>;

    /// Content hash of `value`. Any failure to serialize yields
    /// [`Fingerprint::Unhashable`].
    fn hash(&self, value: &Value) -> Fingerprint {
        match self.dump(value) {
            Ok(bytes) => Fingerprint::of_bytes(&bytes),
            Err(_) => Fingerprint::Unhashable,
        }
    }
}

/// Wire form of a [`Value`]. Temporary files travel as their base64 contents
/// plus suffix, never as a path.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
enum Encoded {
    Data(serde_json::Value),
    TempFile {
        suffix: Option<String>,
        contents: String,
    },
    List(Vec<Encoded>),
    Map(BTreeMap<String, Encoded>),
}

/// JSON serializer. Object keys are emitted sorted, so equal values always
/// produce equal bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    fn encode(value: &Value) -> Result<Encoded, SerializeError> {
        Ok(match value {
            Value::Data(data) => Encoded::Data(data.clone()),
            Value::TempFile(file) => Encoded::TempFile {
                suffix: file.suffix().map(str::to_string),
                contents: STANDARD.encode(file.read()?),
            },
            Value::List(items) => {
                Encoded::List(items.iter().map(Self::encode).collect::<Result<_, _>>()?)
            }
            Value::Map(entries) => Encoded::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), Self::encode(v)?)))
                    .collect::<Result<_, SerializeError>>()?,
            ),
            Value::Opaque(_) => return Err(SerializeError::Unrepresentable(value.kind())),
        })
    }

    fn decode(encoded: Encoded, temp_dir: &Path) -> Result<Value, SerializeError> {
        Ok(match encoded {
            Encoded::Data(data) => Value::Data(data),
            Encoded::TempFile { suffix, contents } => {
                let bytes = STANDARD.decode(contents)?;
                TemporaryFile::with_contents(temp_dir, suffix.as_deref(), &bytes)?.into()
            }
            Encoded::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| Self::decode(item, temp_dir))
                    .collect::<Result<_, _>>()?,
            ),
            Encoded::Map(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| Ok((k, Self::decode(v, temp_dir)?)))
                    .collect::<Result<_, SerializeError>>()?,
            ),
        })
    }
}

impl Serializer for JsonSerializer {
    fn dump(&self, value: &Value) -> Result<Vec<u8>, SerializeError> {
        let encoded = Self::encode(value)?;
        Ok(serde_json::to_vec(&encoded)?)
    }

    fn load(&self, bytes: &[u8], temp_dir: &Path) -> Result<Value, SerializeError> {
        let encoded: Encoded = serde_json::from_slice(bytes)?;
        Self::decode(encoded, temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TempArena;
    use serde_json::json;

    #[test]
    fn test_nested_value_survives_round_trip() {
        let arena = TempArena::new(None).unwrap();
        let mut map = BTreeMap::new();
        map.insert("n".to_string(), Value::from(json!({"b": 1, "a": [true, null]})));
        map.insert("l".to_string(), Value::List(vec!["x".into(), "y".into()]));
        let value = Value::Map(map);

        let bytes = JsonSerializer.dump(&value).unwrap();
        let restored = JsonSerializer.load(&bytes, arena.path()).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_temp_file_is_rehomed_with_contents_and_suffix() {
        let first = TempArena::new(None).unwrap();
        let second = TempArena::new(None).unwrap();
        let original = TemporaryFile::with_contents(first.path(), Some(".csv"), b"a,b\n1,2\n").unwrap();
        let value = Value::from(original.clone());

        let bytes = JsonSerializer.dump(&value).unwrap();
        drop(first);

        let restored = JsonSerializer.load(&bytes, second.path()).unwrap();
        let file = restored.as_temp_file().unwrap();
        assert!(file.path().starts_with(second.path()));
        assert_ne!(file.path(), original.path());
        assert_eq!(file.suffix(), Some(".csv"));
        assert!(file.path().to_string_lossy().ends_with(".csv"));
        assert_eq!(file.read().unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_temp_file_hash_ignores_path() {
        let arena = TempArena::new(None).unwrap();
        let a = TemporaryFile::with_contents(arena.path(), Some(".txt"), b"same").unwrap();
        let b = TemporaryFile::with_contents(arena.path(), Some(".txt"), b"same").unwrap();
        let c = TemporaryFile::with_contents(arena.path(), Some(".txt"), b"other").unwrap();
        assert_eq!(JsonSerializer.hash(&a.into()), JsonSerializer.hash(&b.clone().into()));
        assert_ne!(JsonSerializer.hash(&b.into()), JsonSerializer.hash(&c.into()));
    }

    #[test]
    fn test_opaque_value_is_unhashable() {
        let value = Value::List(vec!["fine".into(), Value::opaque(vec![1u8])]);
        assert!(JsonSerializer.dump(&value).unwrap_err().is_unrepresentable());
        assert!(JsonSerializer.hash(&value).is_unhashable());
    }

    #[test]
    fn test_hash_is_independent_of_key_insertion_order() {
        let a = Value::from(json!({"x": 1, "y": 2}));
        let b = Value::from(json!({"y": 2, "x": 1}));
        assert_eq!(JsonSerializer.hash(&a), JsonSerializer.hash(&b));
        assert_ne!(JsonSerializer.hash(&a), JsonSerializer.hash(&Value::from("x")));
    }
}
