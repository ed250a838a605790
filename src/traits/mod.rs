// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod component;
pub mod loader;

pub use component::{Component, ComponentClass, ComponentInfo, Inputs, PortInfo, StepContext};
pub use loader::{resolve_component, ComponentLoader};
