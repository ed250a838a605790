// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::fingerprint::Fingerprint;

/// Namespace holding a step's named outputs.
pub const OUTPUTS_NAMESPACE: &str = "outputs";
/// Namespace holding component-private memoized work.
pub const INTERNAL_NAMESPACE: &str = "internal";

/// Tuple key of a cache entry: a fingerprint digest followed by a namespace
/// and, for internal entries, the component's own sub-key.
///
/// Only hashable fingerprints can form a key, so an unhashable step can never
/// read or write the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    fingerprint: String,
    parts: Vec<String>,
}

impl CacheKey {
    pub fn outputs(fingerprint: &Fingerprint) -> Option<Self> {
        Self::with_parts(fingerprint, vec![OUTPUTS_NAMESPACE.to_string()])
    }

    pub fn internal(fingerprint: &Fingerprint, sub_key: &str) -> Option<Self> {
        Self::with_parts(
            fingerprint,
            vec![INTERNAL_NAMESPACE.to_string(), sub_key.to_string()],
        )
    }

    fn with_parts(fingerprint: &Fingerprint, parts: Vec<String>) -> Option<Self> {
        fingerprint.digest().map(|digest| Self {
            fingerprint: digest.to_string(),
            parts,
        })
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// All key components, fingerprint first.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.fingerprint.as_str()).chain(self.parts.iter().map(String::as_str))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.components().collect();
        write!(f, "({})", parts.join(", "))
    }
}
