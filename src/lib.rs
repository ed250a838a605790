// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // component registry and built-in components
pub mod cache;      // content stores and value serialization
pub mod config;     // engine config + runtime assembly
pub mod engine;     // executor
pub mod errors;     // error handling
pub mod fingerprint;
pub mod graph;
pub mod observability;
pub mod traits;     // component abstractions
pub mod value;
pub mod workflow;   // workflow model, edits and JSON format
