// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Editing front end for a workflow bound to an executor.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{Action, Position, Step, StepInput, StepInputConnection, Workflow};
use crate::engine::{ExecutionReport, Executor};
use crate::errors::{ActionError, ExecutionError};

/// Notified after every successful edit.
pub trait ChangeObserver: Send + Sync {
    fn on_workflow_action(&self, action: &Action);
}

/// First consumer of a step output, as `(step id, input name, index)`.
pub type Consumer = (String, String, usize);

pub struct WorkflowController {
    current: Workflow,
    executor: Executor,
    observers: Vec<Arc<dyn ChangeObserver>>,
}

impl WorkflowController {
    pub fn new(workflow: Workflow, executor: Executor) -> Self {
        Self {
            current: workflow,
            executor,
            observers: Vec::new(),
        }
    }

    pub fn current_workflow(&self) -> &Workflow {
        &self.current
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn add_change_observer(&mut self, observer: Arc<dyn ChangeObserver>) {
        if !self.observers.iter().any(|o| Arc::ptr_eq(o, &observer)) {
            self.observers.push(observer);
        }
    }

    pub fn remove_change_observer(&mut self, observer: &Arc<dyn ChangeObserver>) {
        self.observers.retain(|o| !Arc::ptr_eq(o, observer));
    }

    pub fn apply_action(&mut self, action: Action) -> Result<(), ActionError> {
        self.apply_all(vec![action])
    }

    /// Applies `actions` in order. Either all of them take effect or none
    /// does; observers hear about each one only after the whole batch
    /// succeeded.
    pub fn apply_all(&mut self, actions: Vec<Action>) -> Result<(), ActionError> {
        let mut next = self.current.clone();
        for action in &actions {
            next = action.apply(&next)?;
        }
        self.current = next;
        for action in &actions {
            for observer in &self.observers {
                observer.on_workflow_action(action);
            }
        }
        Ok(())
    }

    /// Adds `step`, replacing any step with the same id.
    pub fn set_step(&mut self, step: Step) -> Result<(), ActionError> {
        let mut actions = Vec::with_capacity(2);
        if self.current.contains(&step.id) {
            actions.push(Action::RemoveStep {
                step_id: step.id.clone(),
            });
        }
        actions.push(Action::AddStep(step));
        self.apply_all(actions)
    }

    pub fn remove_step(&mut self, step_id: &str) -> Result<(), ActionError> {
        self.apply_action(Action::RemoveStep {
            step_id: step_id.to_string(),
        })
    }

    pub fn move_step(&mut self, step_id: &str, position: Position) -> Result<(), ActionError> {
        self.apply_action(Action::MoveStep {
            step_id: step_id.to_string(),
            position,
        })
    }

    /// Swaps the whole content of one input port for `entries`.
    pub fn replace_inputs(&mut self, step_id: &str, input_name: &str, entries: Vec<StepInput>) -> Result<(), ActionError> {
        let step = self
            .current
            .step(step_id)
            .ok_or_else(|| ActionError::StepNotFound(step_id.to_string()))?;
        let existing = step.inputs.get(input_name).map_or(0, Vec::len);

        let mut actions: Vec<Action> = (0..existing)
            .rev()
            .map(|index| Action::RemoveInput {
                step_id: step_id.to_string(),
                input_name: input_name.to_string(),
                index,
            })
            .collect();
        for (index, entry) in entries.into_iter().enumerate() {
            actions.push(match entry {
                StepInput::Literal(value) => Action::AddInputParameter {
                    step_id: step_id.to_string(),
                    input_name: input_name.to_string(),
                    index,
                    value,
                },
                StepInput::Connection(StepInputConnection {
                    source_step_id,
                    source_output_name,
                }) => Action::AddInputConnection {
                    step_id: step_id.to_string(),
                    input_name: input_name.to_string(),
                    index,
                    source_step_id,
                    source_output_name,
                },
            });
        }
        self.apply_all(actions)
    }

    pub fn step_inputs(&self, step_id: &str) -> Option<&BTreeMap<String, Vec<StepInput>>> {
        self.current.step(step_id).map(|s| &s.inputs)
    }

    /// Outputs of `step_id` that some other step consumes, each with its
    /// first consumer in step id order.
    pub fn connected_outputs(&self, step_id: &str) -> BTreeMap<String, Consumer> {
        let mut connected = BTreeMap::new();
        for step in self.current.steps() {
            for (input_name, index, conn) in step.connections() {
                if conn.source_step_id == step_id {
                    connected
                        .entry(conn.source_output_name.clone())
                        .or_insert_with(|| (step.id.clone(), input_name.to_string(), index));
                }
            }
        }
        connected
    }

    /// Declared outputs of the step's component plus any output name another
    /// step is wired to.
    pub fn step_outputs(&self, step_id: &str) -> Option<BTreeSet<String>> {
        let step = self.current.step(step_id)?;
        let mut outputs: BTreeSet<String> = self
            .executor
            .component_info(&step.component)
            .map(|info| info.outputs.into_iter().collect())
            .unwrap_or_default();
        outputs.extend(self.connected_outputs(step_id).into_keys());
        Some(outputs)
    }

    /// Loads the current workflow into the executor and runs it.
    pub async fn execute(&mut self, sinks: Option<&[&str]>) -> Result<ExecutionReport, ExecutionError> {
        self.executor.load_workflow(self.current.clone())?;
        self.executor.execute(sinks).await
    }
}
