// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::cache::{ContentStore, DirectoryStore, MemoryStore, NullStore};
use crate::config::{CacheKind, EngineConfig};
use crate::engine::{Executor, ExecutorOptions};
use crate::errors::ConfigError;
use crate::traits::ComponentLoader;

/// Assembles a ready-to-load [`Executor`] from an [`EngineConfig`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cacheflow::backends::ComponentRegistry;
/// use cacheflow::config::{EngineConfig, RuntimeBuilder};
/// use cacheflow::traits::ComponentLoader;
///
/// let registry: Arc<dyn ComponentLoader> = Arc::new(ComponentRegistry::with_builtins());
/// let executor = RuntimeBuilder::from_config(&EngineConfig::default(), vec![registry]).unwrap();
/// assert_eq!(executor.store().kind(), "memory");
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    pub fn from_config(cfg: &EngineConfig, loaders: Vec<Arc<dyn ComponentLoader>>) -> Result<Executor, ConfigError> {
        cfg.validate()?;
        let store = Self::store(cfg)?;
        let options = ExecutorOptions {
            max_concurrency: cfg.executor.max_concurrency.max(1),
            temp_dir: cfg.executor.temp_dir.clone(),
            globals: cfg.globals.clone(),
        };
        Ok(Executor::new(loaders, store).with_options(options))
    }

    fn store(cfg: &EngineConfig) -> Result<Arc<dyn ContentStore>, ConfigError> {
        Ok(match cfg.cache.kind {
            CacheKind::Null => Arc::new(NullStore),
            CacheKind::Memory => Arc::new(MemoryStore::new()),
            CacheKind::Directory => {
                let path = cfg.cache.path.clone().ok_or(ConfigError::MissingCachePath)?;
                Arc::new(DirectoryStore::new(path))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::ComponentRegistry;
    use crate::config::{CacheConfig, ExecutorConfig};

    fn loaders() -> Vec<Arc<dyn ComponentLoader>> {
        vec![Arc::new(ComponentRegistry::with_builtins())]
    }

    #[test]
    fn test_store_follows_cache_kind() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = EngineConfig {
            cache: CacheConfig {
                kind: CacheKind::Directory,
                path: Some(dir.path().to_path_buf()),
            },
            executor: ExecutorConfig {
                max_concurrency: 0,
                temp_dir: None,
            },
            ..Default::default()
        };
        let executor = RuntimeBuilder::from_config(&cfg, loaders()).unwrap();
        assert_eq!(executor.store().kind(), "directory");
        assert_eq!(executor.options().max_concurrency, 1);

        let cfg = EngineConfig {
            cache: CacheConfig {
                kind: CacheKind::Null,
                path: None,
            },
            ..Default::default()
        };
        let executor = RuntimeBuilder::from_config(&cfg, loaders()).unwrap();
        assert_eq!(executor.store().kind(), "null");
    }

    #[test]
    fn test_missing_directory_path() {
        let cfg = EngineConfig {
            cache: CacheConfig {
                kind: CacheKind::Directory,
                path: None,
            },
            ..Default::default()
        };
        assert!(matches!(
            RuntimeBuilder::from_config(&cfg, loaders()),
            Err(ConfigError::MissingCachePath)
        ));
    }
}
