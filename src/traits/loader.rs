// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::{ComponentClass, ComponentInfo};
use crate::workflow::ComponentDef;

/// Resolves step descriptors to component classes.
///
/// `None` means "not mine"; the executor asks the next loader in line.
pub trait ComponentLoader: Send + Sync {
    fn get_component(&self, def: &ComponentDef) -> Option<Arc<dyn ComponentClass>>;

    fn get_component_info(&self, def: &ComponentDef) -> Option<ComponentInfo> {
        self.get_component(def).map(|class| class.info())
    }
}

/// First match in registration order.
pub fn resolve_component(
    loaders: &[Arc<dyn ComponentLoader>],
    def: &ComponentDef,
) -> Option<Arc<dyn ComponentClass>> {
    loaders.iter().find_map(|loader| loader.get_component(def))
}
