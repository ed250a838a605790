// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for structured logging.
//!
//! Each message is a small struct implementing `Display` for the human
//! readable line and [`StructuredLog`] for emitting it with typed fields.
//!
//! * `engine` - workflow loading, reconciliation and execution lifecycle
//! * `step` - per-step execution and cache decisions
//! * `cache` - content store failures that degrade to misses
//!
//! # Usage Pattern
//!
//! ```rust
//! use cacheflow::observability::messages::engine::ExecutionStarted;
//! use cacheflow::observability::messages::StructuredLog;
//!
//! let msg = ExecutionStarted {
//!     step_count: 5,
//!     max_concurrency: 1,
//! };
//!
//! msg.log();
//! ```

pub mod cache;
pub mod engine;
pub mod step;

use tracing::Span;

/// Emits a message with structured fields at its own level.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
