// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Component providers.
//!
//! [`ComponentRegistry`] is the explicit loader the engine is handed at
//! construction; [`builtin`] holds the components every registry can start
//! with. The `stub` module (test builds only) provides mock components with
//! invocation counters.

pub mod builtin;
mod registry;
#[cfg(test)]
pub mod stub;

pub use registry::ComponentRegistry;
