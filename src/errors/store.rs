// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failure to turn a value into bytes or back.
///
/// `Unrepresentable` is an expected outcome: callers degrade it to an
/// unhashable fingerprint or a skipped cache write.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("value of kind '{0}' cannot be serialized")]
    Unrepresentable(&'static str),

    #[error("invalid encoding: {0}")]
    Format(#[from] serde_json::Error),

    #[error("invalid embedded file contents: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("temporary file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl SerializeError {
    pub fn is_unrepresentable(&self) -> bool {
        matches!(self, SerializeError::Unrepresentable(_))
    }
}

/// Errors of [`ContentStore`](crate::cache::ContentStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache entry not found")]
    NotFound,

    #[error("cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error("cache entry holds a {0} value, expected a map of outputs")]
    Malformed(&'static str),
}
