// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::errors::ActionError;
use crate::value::Value;

/// Key under which a descriptor names its component type.
pub const COMPONENT_TYPE_KEY: &str = "type";

/// Loader-specific record identifying which capability runs a step, e.g.
/// `{"type": "download"}` plus whatever parameters the loader understands.
///
/// Backed by a `serde_json::Map`, which keeps keys sorted; the canonical
/// encoding used for fingerprinting relies on that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentDef(pub Map<String, serde_json::Value>);

impl ComponentDef {
    pub fn new(type_name: &str) -> Self {
        let mut map = Map::new();
        map.insert(COMPONENT_TYPE_KEY.to_string(), type_name.into());
        Self(map)
    }

    pub fn with_param(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn type_name(&self) -> Option<&str> {
        self.0.get(COMPONENT_TYPE_KEY).and_then(|v| v.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Stable textual form with sorted keys.
    pub fn canonical(&self) -> String {
        serde_json::Value::Object(self.0.clone()).to_string()
    }
}

impl fmt::Display for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_name() {
            Some(name) => f.write_str(name),
            None => f.write_str(&self.canonical()),
        }
    }
}

/// Weak reference to another step's named output. Resolving it requires a
/// lookup in the current [`Workflow`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepInputConnection {
    pub source_step_id: String,
    pub source_output_name: String,
}

impl StepInputConnection {
    pub fn new(source_step_id: &str, source_output_name: &str) -> Self {
        Self {
            source_step_id: source_step_id.to_string(),
            source_output_name: source_output_name.to_string(),
        }
    }
}

impl fmt::Display for StepInputConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.source_step_id, self.source_output_name)
    }
}

/// One entry of an input port.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    Literal(Value),
    Connection(StepInputConnection),
}

/// Canvas coordinates. Presentation only; never part of a fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A node of the workflow graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: String,
    pub component: ComponentDef,
    /// Port name -> ordered values. A port may aggregate several entries.
    pub inputs: BTreeMap<String, Vec<StepInput>>,
    pub position: Option<Position>,
}

impl Step {
    pub fn new(id: &str, component: ComponentDef) -> Self {
        Self {
            id: id.to_string(),
            component,
            inputs: BTreeMap::new(),
            position: None,
        }
    }

    pub fn with_literal(mut self, input: &str, value: impl Into<Value>) -> Self {
        self.inputs
            .entry(input.to_string())
            .or_default()
            .push(StepInput::Literal(value.into()));
        self
    }

    pub fn with_connection(mut self, input: &str, source_step_id: &str, source_output_name: &str) -> Self {
        self.inputs
            .entry(input.to_string())
            .or_default()
            .push(StepInput::Connection(StepInputConnection::new(
                source_step_id,
                source_output_name,
            )));
        self
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Some(Position::new(x, y));
        self
    }

    /// Every connection entry as `(input name, index in port, connection)`.
    pub fn connections(&self) -> impl Iterator<Item = (&str, usize, &StepInputConnection)> {
        self.inputs.iter().flat_map(|(name, values)| {
            values.iter().enumerate().filter_map(move |(index, input)| match input {
                StepInput::Connection(conn) => Some((name.as_str(), index, conn)),
                StepInput::Literal(_) => None,
            })
        })
    }
}

/// Immutable snapshot of a workflow.
///
/// Edits never happen in place: each action from
/// [`actions`](crate::workflow::actions) yields a new `Workflow`. Steps are
/// shared between snapshots through `Arc`, so unchanged steps are not copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workflow {
    steps: BTreeMap<String, Arc<Step>>,
    meta: Map<String, serde_json::Value>,
}

impl Workflow {
    /// Builds a workflow from a list of steps; identifiers must be unique.
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Result<Self, ActionError> {
        let mut map = BTreeMap::new();
        for step in steps {
            if map.contains_key(&step.id) {
                return Err(ActionError::StepExists(step.id));
            }
            map.insert(step.id.clone(), Arc::new(step));
        }
        Ok(Self {
            steps: map,
            meta: Map::new(),
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_meta(mut self, meta: Map<String, serde_json::Value>) -> Self {
        self.meta = meta;
        self
    }

    pub fn meta(&self) -> &Map<String, serde_json::Value> {
        &self.meta
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.get(id).map(|s| s.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.steps.contains_key(id)
    }

    /// Steps in identifier order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.values().map(|s| s.as_ref())
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &String> {
        self.steps.keys()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// New snapshot with `step` inserted or replaced.
    pub(crate) fn with_step(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.insert(step.id.clone(), Arc::new(step));
        Self {
            steps,
            meta: self.meta.clone(),
        }
    }

    /// New snapshot without step `id`.
    pub(crate) fn without_step(&self, id: &str) -> Self {
        let mut steps = self.steps.clone();
        steps.remove(id);
        Self {
            steps,
            meta: self.meta.clone(),
        }
    }
}
