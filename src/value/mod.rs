// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dynamic values exchanged between workflow steps.
//!
//! A [`Value`] is what a literal input holds and what a component produces on
//! its named outputs. Most values are plain JSON data; the other variants
//! exist for the two cases the cache has to treat specially:
//!
//! * `TempFile` - an ephemeral file living in the current temporary arena.
//!   The serializer embeds its contents so it can be replayed later.
//! * `Opaque` - an in-process object with no byte representation. Anything
//!   containing one is unhashable and never cached.

mod temp_file;

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use temp_file::{TempArena, TemporaryFile};

/// A value flowing through the workflow graph.
#[derive(Clone)]
pub enum Value {
    Data(serde_json::Value),
    TempFile(Arc<TemporaryFile>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wraps an in-process object that cannot be serialized.
    pub fn opaque<T: Any + Send + Sync>(object: T) -> Self {
        Value::Opaque(Arc::new(object))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Data(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_temp_file(&self) -> Option<&TemporaryFile> {
        match self {
            Value::TempFile(file) => Some(file),
            _ => None,
        }
    }

    /// Short name of the variant, used in log fields and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Data(_) => "data",
            Value::TempFile(_) => "temp_file",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Opaque(_) => "opaque",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(data) => write!(f, "Data({})", data),
            Value::TempFile(file) => f.debug_tuple("TempFile").field(&file.path()).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// Structural equality. Temporary files compare by path, opaque objects by
/// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::TempFile(a), Value::TempFile(b)) => a.path() == b.path(),
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(data: serde_json::Value) -> Self {
        Value::Data(data)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(serde_json::Value::String(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Data(serde_json::Value::String(s))
    }
}

impl From<TemporaryFile> for Value {
    fn from(file: TemporaryFile) -> Self {
        Value::TempFile(Arc::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_conversions() {
        let value = Value::from("hello");
        assert_eq!(value.as_str(), Some("hello"));
        assert_eq!(value.kind(), "data");
        assert_eq!(Value::from(json!(3)).as_str(), None);
    }

    #[test]
    fn test_opaque_equality_is_identity() {
        let a = Value::opaque(42u32);
        let b = a.clone();
        let c = Value::opaque(42u32);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
