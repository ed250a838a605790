// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::InternalCache;
use crate::errors::ComponentError;
use crate::fingerprint::{self, Fingerprint};
use crate::value::Value;
use crate::workflow::ComponentDef;

/// Declared port of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    /// Whether the port accepts more than one value.
    pub multiple: bool,
}

impl PortInfo {
    pub fn single(name: &str) -> Self {
        Self {
            name: name.to_string(),
            multiple: false,
        }
    }

    pub fn multiple(name: &str) -> Self {
        Self {
            name: name.to_string(),
            multiple: true,
        }
    }
}

/// Introspection data for tooling and for the executor's arity check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentInfo {
    pub label: String,
    pub inputs: Vec<PortInfo>,
    pub outputs: Vec<String>,
}

impl ComponentInfo {
    pub fn input(&self, name: &str) -> Option<&PortInfo> {
        self.inputs.iter().find(|port| port.name == name)
    }
}

/// A capability that can be bound to steps.
pub trait ComponentClass: Send + Sync {
    /// Fully-qualified type identity; part of every fingerprint.
    fn identity(&self) -> &str;

    fn info(&self) -> ComponentInfo;

    fn instantiate(&self, step_id: &str, def: &ComponentDef) -> Result<Box<dyn Component>, ComponentError>;

    /// Combines identity, descriptor and input tokens. Override only to mix in
    /// extra identity; the result must stay a pure function of the arguments.
    fn compute_hash(&self, def: &ComponentDef, inputs: &BTreeMap<String, Vec<String>>) -> Fingerprint {
        fingerprint::combine(self.identity(), def, inputs)
    }
}

/// Live instance bound to one step.
#[async_trait]
pub trait Component: Send {
    /// Runs the step. Outputs are published through
    /// [`StepContext::set_output`].
    async fn execute(&mut self, inputs: Inputs, ctx: &mut StepContext) -> Result<(), ComponentError>;

    /// Called once when the step leaves the workflow or is superseded.
    fn dispose(&mut self) {}
}

/// Resolved input values of one invocation, by port name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inputs(BTreeMap<String, Vec<Value>>);

impl Inputs {
    pub fn new(values: BTreeMap<String, Vec<Value>>) -> Self {
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// First value of a port, if any.
    pub fn single(&self, name: &str) -> Option<&Value> {
        self.0.get(name).and_then(|values| values.first())
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<Value>> {
        self.0
    }
}

/// Everything a component may touch while executing besides its inputs.
pub struct StepContext {
    step_id: String,
    temp_dir: PathBuf,
    globals: Arc<serde_json::Map<String, serde_json::Value>>,
    internal_cache: InternalCache,
    outputs: BTreeMap<String, Value>,
}

impl StepContext {
    pub fn new(
        step_id: &str,
        temp_dir: PathBuf,
        globals: Arc<serde_json::Map<String, serde_json::Value>>,
        internal_cache: InternalCache,
    ) -> Self {
        Self {
            step_id: step_id.to_string(),
            temp_dir,
            globals,
            internal_cache,
            outputs: BTreeMap::new(),
        }
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Scratch directory; everything in it is removed when `execute()` ends.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn global(&self, key: &str) -> Option<&serde_json::Value> {
        self.globals.get(key)
    }

    pub fn internal_cache(&self) -> &InternalCache {
        &self.internal_cache
    }

    pub fn set_output(&mut self, name: &str, value: impl Into<Value>) {
        self.outputs.insert(name.to_string(), value.into());
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    pub fn into_outputs(self) -> BTreeMap<String, Value> {
        self.outputs
    }
}
