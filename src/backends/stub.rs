// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles: a configurable mock component with shared counters.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::ComponentRegistry;
use crate::cache::{InternalCache, NullStore};
use crate::errors::ComponentError;
use crate::fingerprint::Fingerprint;
use crate::traits::{Component, ComponentClass, ComponentInfo, Inputs, PortInfo, StepContext};
use crate::value::Value;
use crate::workflow::{ComponentDef, Workflow};

/// Counters shared by every instance of one [`MockClass`].
#[derive(Debug, Default)]
pub struct MockCounters {
    pub created: AtomicUsize,
    pub executed: AtomicUsize,
    pub disposed: AtomicUsize,
    executed_steps: Mutex<Vec<String>>,
}

impl MockCounters {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Step ids in invocation order.
    pub fn executed_steps(&self) -> Vec<String> {
        self.executed_steps.lock().unwrap().clone()
    }

    pub fn reset(&self) {
        self.created.store(0, Ordering::SeqCst);
        self.executed.store(0, Ordering::SeqCst);
        self.disposed.store(0, Ordering::SeqCst);
        self.executed_steps.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockBehavior {
    Echo,
    Fail,
    OpaqueOutput,
    NoOutput,
}

/// Mock component class.
///
/// Its instances publish output `o`: a map of every input port's values. The
/// output depends on nothing else, so steps sharing a fingerprint also share
/// their outputs. Ports are all `multiple` unless declared otherwise.
pub struct MockClass {
    identity: String,
    behavior: MockBehavior,
    inputs: Vec<PortInfo>,
    counters: Arc<MockCounters>,
}

impl MockClass {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            behavior: MockBehavior::Echo,
            inputs: Vec::new(),
            counters: Arc::new(MockCounters::default()),
        }
    }

    pub fn failing(mut self) -> Self {
        self.behavior = MockBehavior::Fail;
        self
    }

    pub fn with_opaque_output(mut self) -> Self {
        self.behavior = MockBehavior::OpaqueOutput;
        self
    }

    pub fn without_output(mut self) -> Self {
        self.behavior = MockBehavior::NoOutput;
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<PortInfo>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn counters(&self) -> Arc<MockCounters> {
        self.counters.clone()
    }
}

impl ComponentClass for MockClass {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn info(&self) -> ComponentInfo {
        ComponentInfo {
            label: self.identity.clone(),
            inputs: self.inputs.clone(),
            outputs: vec!["o".to_string()],
        }
    }

    fn instantiate(&self, step_id: &str, _def: &ComponentDef) -> Result<Box<dyn Component>, ComponentError> {
        self.counters.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockComponent {
            step_id: step_id.to_string(),
            behavior: self.behavior,
            counters: self.counters.clone(),
        }))
    }
}

struct MockComponent {
    step_id: String,
    behavior: MockBehavior,
    counters: Arc<MockCounters>,
}

#[async_trait]
impl Component for MockComponent {
    async fn execute(&mut self, inputs: Inputs, ctx: &mut StepContext) -> Result<(), ComponentError> {
        self.counters.executed.fetch_add(1, Ordering::SeqCst);
        self.counters
            .executed_steps
            .lock()
            .unwrap()
            .push(self.step_id.clone());

        match self.behavior {
            MockBehavior::Fail => Err(format!("simulated failure in {}", self.step_id).into()),
            MockBehavior::NoOutput => Ok(()),
            MockBehavior::OpaqueOutput => {
                ctx.set_output("o", Value::opaque(self.step_id.clone()));
                Ok(())
            }
            MockBehavior::Echo => {
                let mut output = BTreeMap::new();
                for (name, values) in inputs.into_inner() {
                    output.insert(name, Value::List(values));
                }
                ctx.set_output("o", Value::Map(output));
                Ok(())
            }
        }
    }

    fn dispose(&mut self) {
        self.counters.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Binds every step of `workflow` to `class`.
pub fn stub_classes(
    workflow: &Workflow,
    class: Arc<dyn ComponentClass>,
) -> BTreeMap<String, Arc<dyn ComponentClass>> {
    workflow
        .step_ids()
        .map(|id| (id.clone(), class.clone()))
        .collect()
}

/// Registry resolving descriptor type `mock` to `class`.
pub fn mock_registry(class: Arc<dyn ComponentClass>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    registry.register("mock", class);
    registry
}

/// Context with no globals and a disabled internal cache.
pub fn test_context(step_id: &str, temp_dir: &Path) -> StepContext {
    StepContext::new(
        step_id,
        temp_dir.to_path_buf(),
        Arc::new(serde_json::Map::new()),
        InternalCache::new(Arc::new(NullStore), Fingerprint::Unhashable, temp_dir.to_path_buf()),
    )
}
