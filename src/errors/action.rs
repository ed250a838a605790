// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// An edit that cannot be applied to the current workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Step '{0}' already exists")]
    StepExists(String),

    #[error("Step '{0}' does not exist")]
    StepNotFound(String),

    #[error("Step '{step_id}' has no input '{input_name}'")]
    InputNotFound { step_id: String, input_name: String },

    #[error("Step '{step_id}' input '{input_name}': index {index} out of range (len {len})")]
    IndexOutOfRange {
        step_id: String,
        input_name: String,
        index: usize,
        len: usize,
    },
}

/// A malformed JSON workflow definition.
#[derive(Debug, Error)]
pub enum WorkflowJsonError {
    #[error("invalid workflow JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),

    #[error("step '{step_id}': {message}")]
    InvalidStep { step_id: String, message: String },

    #[error(transparent)]
    Action(#[from] ActionError),
}
