// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Content-addressable cache.
//!
//! Entries are keyed by [`CacheKey`]: a step fingerprint plus a namespace.
//! The `outputs` namespace holds a step's named outputs as one map value; the
//! `internal` namespace is handed to components through [`InternalCache`].

mod directory;
mod internal;
mod key;
mod memory;
mod serializer;
mod store;

pub use directory::DirectoryStore;
pub use internal::InternalCache;
pub use key::{CacheKey, INTERNAL_NAMESPACE, OUTPUTS_NAMESPACE};
pub use memory::MemoryStore;
pub use serializer::{JsonSerializer, Serializer};
pub use store::{ContentStore, NullStore};
