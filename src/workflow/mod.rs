// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod actions;
pub mod controller;
pub mod json;
mod model;

pub use actions::Action;
pub use controller::{ChangeObserver, WorkflowController};
pub use json::{workflow_from_json, workflow_from_str, workflow_to_json};
pub use model::{ComponentDef, Position, Step, StepInput, StepInputConnection, Workflow, COMPONENT_TYPE_KEY};
