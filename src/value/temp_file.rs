// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A file created inside a [`TempArena`].
///
/// The file itself is owned by the arena: it disappears when the arena is
/// dropped, whatever still references this handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryFile {
    path: PathBuf,
    suffix: Option<String>,
}

impl TemporaryFile {
    /// Creates a new empty file in `dir`, keeping `suffix` (e.g. `.csv`) as its
    /// extension.
    pub fn create(dir: &Path, suffix: Option<&str>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cf_");
        if let Some(suffix) = suffix {
            builder.suffix(suffix);
        }
        let path = builder
            .tempfile_in(dir)?
            .into_temp_path()
            .keep()
            .map_err(|e| e.error)?;
        Ok(Self {
            path,
            suffix: suffix.map(str::to_string),
        })
    }

    /// Creates a file in `dir` holding `contents`.
    pub fn with_contents(dir: &Path, suffix: Option<&str>, contents: &[u8]) -> io::Result<Self> {
        let file = Self::create(dir, suffix)?;
        std::fs::write(&file.path, contents)?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Scratch directory scoped to one `execute()` call.
///
/// Every temporary artifact produced or replayed during the call lives here;
/// dropping the arena removes the directory and everything in it, on success
/// and on failure alike.
#[derive(Debug)]
pub struct TempArena {
    dir: TempDir,
}

impl TempArena {
    pub fn new(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("cacheflow-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
