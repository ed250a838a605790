// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in components: `empty_file` and `download`.

mod download;
mod empty_file;

use std::sync::Arc;

use super::ComponentRegistry;

pub use download::{Download, DOWNLOAD_IDENTITY};
pub use empty_file::{EmptyFile, EMPTY_FILE_IDENTITY};

pub fn register(registry: &mut ComponentRegistry) {
    registry
        .register("download", Arc::new(Download))
        .register("empty_file", Arc::new(EmptyFile));
}
