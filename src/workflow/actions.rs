// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow edits.
//!
//! An [`Action`] never mutates a workflow: `apply` validates the edit against
//! the current snapshot and returns the next one.

use super::{Position, Step, StepInput, StepInputConnection, Workflow};
use crate::errors::ActionError;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddStep(Step),
    RemoveStep {
        step_id: String,
    },
    /// Inserts a literal at `index` of a port; `index` may equal the port's
    /// length to append.
    AddInputParameter {
        step_id: String,
        input_name: String,
        index: usize,
        value: Value,
    },
    AddInputConnection {
        step_id: String,
        input_name: String,
        index: usize,
        source_step_id: String,
        source_output_name: String,
    },
    RemoveInput {
        step_id: String,
        input_name: String,
        index: usize,
    },
    MoveStep {
        step_id: String,
        position: Position,
    },
}

impl Action {
    /// Step the action edits.
    pub fn step_id(&self) -> &str {
        match self {
            Action::AddStep(step) => &step.id,
            Action::RemoveStep { step_id }
            | Action::AddInputParameter { step_id, .. }
            | Action::AddInputConnection { step_id, .. }
            | Action::RemoveInput { step_id, .. }
            | Action::MoveStep { step_id, .. } => step_id,
        }
    }

    pub fn apply(&self, workflow: &Workflow) -> Result<Workflow, ActionError> {
        match self {
            Action::AddStep(step) => {
                if workflow.contains(&step.id) {
                    return Err(ActionError::StepExists(step.id.clone()));
                }
                Ok(workflow.with_step(step.clone()))
            }
            Action::RemoveStep { step_id } => {
                existing(workflow, step_id)?;
                Ok(workflow.without_step(step_id))
            }
            Action::AddInputParameter {
                step_id,
                input_name,
                index,
                value,
            } => insert_input(
                workflow,
                step_id,
                input_name,
                *index,
                StepInput::Literal(value.clone()),
            ),
            Action::AddInputConnection {
                step_id,
                input_name,
                index,
                source_step_id,
                source_output_name,
            } => insert_input(
                workflow,
                step_id,
                input_name,
                *index,
                StepInput::Connection(StepInputConnection::new(source_step_id, source_output_name)),
            ),
            Action::RemoveInput {
                step_id,
                input_name,
                index,
            } => {
                let mut step = existing(workflow, step_id)?.clone();
                let entries = step
                    .inputs
                    .get_mut(input_name)
                    .ok_or_else(|| ActionError::InputNotFound {
                        step_id: step_id.clone(),
                        input_name: input_name.clone(),
                    })?;
                if *index >= entries.len() {
                    return Err(ActionError::IndexOutOfRange {
                        step_id: step_id.clone(),
                        input_name: input_name.clone(),
                        index: *index,
                        len: entries.len(),
                    });
                }
                entries.remove(*index);
                Ok(workflow.with_step(step))
            }
            Action::MoveStep { step_id, position } => {
                let mut step = existing(workflow, step_id)?.clone();
                step.position = Some(*position);
                Ok(workflow.with_step(step))
            }
        }
    }
}

fn existing<'a>(workflow: &'a Workflow, step_id: &str) -> Result<&'a Step, ActionError> {
    workflow
        .step(step_id)
        .ok_or_else(|| ActionError::StepNotFound(step_id.to_string()))
}

fn insert_input(
    workflow: &Workflow,
    step_id: &str,
    input_name: &str,
    index: usize,
    input: StepInput,
) -> Result<Workflow, ActionError> {
    let mut step = existing(workflow, step_id)?.clone();
    let entries = step.inputs.entry(input_name.to_string()).or_default();
    if index > entries.len() {
        return Err(ActionError::IndexOutOfRange {
            step_id: step_id.to_string(),
            input_name: input_name.to_string(),
            index,
            len: entries.len(),
        });
    }
    entries.insert(index, input);
    Ok(workflow.with_step(step))
}
