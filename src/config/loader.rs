// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ConfigError;

/// Engine configuration, usually read from a YAML or TOML file.
///
/// Every section is optional.
///
/// # Example
/// ```yaml
/// cache:
///   kind: directory
///   path: _cf_cache
/// executor:
///   max_concurrency: 4
///   temp_dir: /var/tmp
/// globals:
///   api_host: localhost
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    /// Free-form values handed to every component.
    #[serde(default)]
    pub globals: serde_json::Map<String, serde_json::Value>,
}

/// Which content store backs step outputs.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default, deserialize_with = "cache_kind")]
    pub kind: CacheKind,
    /// Root directory; required when `kind` is `directory`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    /// Caching disabled.
    Null,
    #[default]
    Memory,
    Directory,
}

// YAML reads a bare `null` as the null scalar, so `kind: null` arrives as
// `None` rather than as a string.
fn cache_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<CacheKind, D::Error> {
    match Option::<String>::deserialize(deserializer)?.as_deref() {
        None | Some("null") => Ok(CacheKind::Null),
        Some("memory") => Ok(CacheKind::Memory),
        Some("directory") => Ok(CacheKind::Directory),
        Some(other) => Err(D::Error::unknown_variant(other, &["null", "memory", "directory"])),
    }
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExecutorConfig {
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    pub temp_dir: Option<PathBuf>,
}

fn default_max_concurrency() -> usize {
    1
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            temp_dir: None,
        }
    }
}

enum Format {
    Yaml,
    Toml,
}

impl Format {
    fn of(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            Some("toml") => Ok(Format::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let format = Format::of(path)?;
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match format {
        Format::Yaml => parse_yaml(&contents),
        Format::Toml => parse_toml(&contents),
    }
}

/// Loads and checks cross-field constraints.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn parse_yaml(contents: &str) -> Result<EngineConfig, ConfigError> {
    // An empty file is an empty mapping.
    if contents.trim().is_empty() {
        return Ok(EngineConfig::default());
    }
    Ok(serde_yaml::from_str(contents)?)
}

pub fn parse_toml(contents: &str) -> Result<EngineConfig, ConfigError> {
    Ok(toml::from_str(contents)?)
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.kind == CacheKind::Directory && self.cache.path.is_none() {
            return Err(ConfigError::MissingCachePath);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_full_yaml_config() {
        let yaml = r#"
cache:
  kind: directory
  path: _cf_cache
executor:
  max_concurrency: 4
  temp_dir: /var/tmp
globals:
  api_host: localhost
"#;
        let cfg = parse_yaml(yaml).unwrap();
        assert_eq!(cfg.cache.kind, CacheKind::Directory);
        assert_eq!(cfg.cache.path, Some(PathBuf::from("_cf_cache")));
        assert_eq!(cfg.executor.max_concurrency, 4);
        assert_eq!(cfg.executor.temp_dir, Some(PathBuf::from("/var/tmp")));
        assert_eq!(cfg.globals["api_host"], "localhost");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let cfg = parse_yaml("").unwrap();
        assert_eq!(cfg, EngineConfig::default());
        assert_eq!(cfg.cache.kind, CacheKind::Memory);
        assert_eq!(cfg.executor.max_concurrency, 1);

        let cfg = parse_yaml("cache:\n  kind: null\n").unwrap();
        assert_eq!(cfg.cache.kind, CacheKind::Null);

        let cfg = parse_yaml("cache:\n  kind: null_store\n");
        assert!(matches!(cfg, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[cache]
kind = "null"

[executor]
max_concurrency = 2

[globals]
retries = 3
"#;
        let cfg = parse_toml(toml).unwrap();
        assert_eq!(cfg.cache.kind, CacheKind::Null);
        assert_eq!(cfg.executor.max_concurrency, 2);
        assert_eq!(cfg.globals["retries"], 3);
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse_yaml("executor:\n  strategy: level\n").is_err());
    }

    #[test]
    fn test_directory_cache_requires_path() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "cache:\n  kind: directory").unwrap();

        let result = load_and_validate_config(file.path());
        assert!(matches!(result, Err(ConfigError::MissingCachePath)));
    }

    #[test]
    fn test_format_chosen_by_extension() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            load_config("does/not/exist.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
