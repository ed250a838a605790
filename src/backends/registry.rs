// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;

use super::builtin;
use crate::traits::{ComponentClass, ComponentLoader};
use crate::workflow::ComponentDef;

/// Explicit table of component classes keyed by descriptor `type`.
///
/// Constructed and handed to the executor as one of its loaders; there is no
/// process-wide registry.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    classes: BTreeMap<String, Arc<dyn ComponentClass>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in components.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register(&mut registry);
        registry
    }

    pub fn register(&mut self, type_name: &str, class: Arc<dyn ComponentClass>) -> &mut Self {
        self.classes.insert(type_name.to_string(), class);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn ComponentClass>> {
        self.classes.get(type_name).cloned()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &String> {
        self.classes.keys()
    }
}

impl ComponentLoader for ComponentRegistry {
    fn get_component(&self, def: &ComponentDef) -> Option<Arc<dyn ComponentClass>> {
        def.type_name().and_then(|name| self.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::MockClass;
    use crate::traits::resolve_component;

    #[test]
    fn test_builtins_are_registered() {
        let registry = ComponentRegistry::with_builtins();
        let names: Vec<_> = registry.type_names().cloned().collect();
        assert_eq!(names, vec!["download".to_string(), "empty_file".to_string()]);

        let info = registry
            .get_component_info(&ComponentDef::new("download"))
            .unwrap();
        assert_eq!(info.outputs, vec!["file".to_string()]);
    }

    #[test]
    fn test_unknown_or_untyped_descriptor() {
        let registry = ComponentRegistry::with_builtins();
        assert!(registry.get_component(&ComponentDef::new("nope")).is_none());
        assert!(registry.get_component(&ComponentDef::default()).is_none());
    }

    #[test]
    fn test_first_loader_wins() {
        let mut first = ComponentRegistry::new();
        first.register("download", Arc::new(MockClass::new("first.download")));
        let loaders: Vec<Arc<dyn ComponentLoader>> =
            vec![Arc::new(first), Arc::new(ComponentRegistry::with_builtins())];

        let class = resolve_component(&loaders, &ComponentDef::new("download")).unwrap();
        assert_eq!(class.identity(), "first.download");
        let class = resolve_component(&loaders, &ComponentDef::new("empty_file")).unwrap();
        assert_eq!(class.identity(), builtin::EMPTY_FILE_IDENTITY);
        assert!(resolve_component(&loaders, &ComponentDef::new("script")).is_none());
    }
}
