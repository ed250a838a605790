// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;

pub use dependency_graph::{DependencyGraph, Dependent};
