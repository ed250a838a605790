// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod action;
mod config;
mod execution;
mod graph;
mod store;

pub use action::{ActionError, WorkflowJsonError};
pub use config::ConfigError;
pub use execution::{ComponentError, ExecutionError};
pub use graph::GraphError;
pub use store::{SerializeError, StoreError};
