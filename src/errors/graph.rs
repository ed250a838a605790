// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Structural problems in a workflow's connection graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A connection names a step that is not part of the workflow.
    MissingReference {
        step_id: String,
        input_name: String,
        source_step_id: String,
    },
    /// Connections form a cycle. The path starts and ends with the same step.
    Cycle { cycle: Vec<String> },
    /// A requested sink is not part of the workflow.
    UnknownStep { step_id: String },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::MissingReference {
                step_id,
                input_name,
                source_step_id,
            } => write!(
                f,
                "Step '{}' input '{}' is connected to '{}' which does not exist",
                step_id, input_name, source_step_id
            ),
            GraphError::Cycle { cycle } => {
                write!(f, "Cannot compute fingerprints: cycle {}", cycle.join(" -> "))
            }
            GraphError::UnknownStep { step_id } => {
                write!(f, "Step '{}' is not part of the workflow", step_id)
            }
        }
    }
}

impl std::error::Error for GraphError {}
