// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Content store failures. Both degrade gracefully: a failed read is a miss,
//! a failed write leaves the entry absent.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::cache::CacheKey;
use crate::errors::StoreError;
use crate::observability::messages::StructuredLog;

pub struct CacheReadFailed<'a> {
    pub key: &'a CacheKey,
    pub error: &'a StoreError,
}

impl Display for CacheReadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cache read of {} failed, treating as miss: {}", self.key, self.error)
    }
}

impl StructuredLog for CacheReadFailed<'_> {
    fn log(&self) {
        tracing::warn!(key = %self.key, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cache_read_failed", span_name = name, key = %self.key)
    }
}

pub struct CacheWriteFailed<'a> {
    pub key: &'a CacheKey,
    pub error: &'a StoreError,
}

impl Display for CacheWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cache write of {} failed: {}", self.key, self.error)
    }
}

impl StructuredLog for CacheWriteFailed<'_> {
    fn log(&self) {
        tracing::warn!(key = %self.key, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cache_write_failed", span_name = name, key = %self.key)
    }
}
