// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use super::GraphError;

/// Error raised by a component while instantiating or executing.
pub type ComponentError = Box<dyn std::error::Error + Send + Sync>;

/// Fatal errors of `Executor::load_workflow` and `Executor::execute`.
///
/// Every variant names the offending step so callers never have to dig into
/// the fingerprint engine or the content store to find out what went wrong.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Step '{step_id}': no loader provides component '{component}'")]
    MissingComponent { step_id: String, component: String },

    #[error("Step '{step_id}': failed to create component: {source}")]
    InstantiationFailed {
        step_id: String,
        #[source]
        source: ComponentError,
    },

    #[error("Step '{step_id}': input '{input_name}' expects a single value but received {count}")]
    InputArity {
        step_id: String,
        input_name: String,
        count: usize,
    },

    #[error("Step '{step_id}' failed: {source}")]
    StepFailed {
        step_id: String,
        #[source]
        source: ComponentError,
    },

    #[error("Step '{step_id}' did not produce output '{output_name}' required by '{dependent}'")]
    MissingOutput {
        step_id: String,
        output_name: String,
        dependent: String,
    },

    #[error("{count} step(s) could not run, they form a cycle or depend on one: {}", .steps.join(", "))]
    Stuck { count: usize, steps: Vec<String> },

    #[error("No workflow has been loaded")]
    NotLoaded,

    #[error("Failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("Execution task panicked while running {}: {source}", .running.join(", "))]
    TaskPanicked {
        running: Vec<String>,
        #[source]
        source: tokio::task::JoinError,
    },
}
