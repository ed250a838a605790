// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;

pub use loader::{
    load_and_validate_config, load_config, parse_toml, parse_yaml, CacheConfig, CacheKind, EngineConfig,
    ExecutorConfig,
};
pub use runtime::RuntimeBuilder;
