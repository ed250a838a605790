// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! JSON workflow definitions.
//!
//! ```json
//! {
//!   "steps": {
//!     "fetch": {
//!       "component": {"type": "download"},
//!       "parameters": [{"url": "file:///data/table.csv"}],
//!       "position": [0, 0]
//!     },
//!     "copy": {
//!       "component": {"type": "mock"},
//!       "inputs": [{"i": "fetch.file"}]
//!     }
//!   },
//!   "meta": {}
//! }
//! ```
//!
//! Within a port, parameters come before connections.

use serde_json::{json, Map, Value as Json};

use super::{ComponentDef, Position, Step, StepInput, Workflow};
use crate::errors::WorkflowJsonError;
use crate::value::Value;

const WORKFLOW_REQUIRED: &[&str] = &["steps"];
const WORKFLOW_OPTIONAL: &[&str] = &["meta"];
const STEP_REQUIRED: &[&str] = &["component"];
const STEP_OPTIONAL: &[&str] = &["inputs", "outputs", "parameters", "description", "position"];

pub fn workflow_from_str(text: &str) -> Result<Workflow, WorkflowJsonError> {
    let document: Json = serde_json::from_str(text)?;
    workflow_from_json(&document)
}

pub fn workflow_from_json(document: &Json) -> Result<Workflow, WorkflowJsonError> {
    let top = check_keys(document, WORKFLOW_REQUIRED, WORKFLOW_OPTIONAL)
        .map_err(WorkflowJsonError::Invalid)?;
    let steps_obj = top
        .get("steps")
        .and_then(Json::as_object)
        .ok_or_else(|| WorkflowJsonError::Invalid("'steps' must be an object".to_string()))?;

    let mut steps = Vec::with_capacity(steps_obj.len());
    for (step_id, definition) in steps_obj {
        steps.push(parse_step(step_id, definition).map_err(|message| {
            WorkflowJsonError::InvalidStep {
                step_id: step_id.clone(),
                message,
            }
        })?);
    }

    let meta = match top.get("meta") {
        None | Some(Json::Null) => Map::new(),
        Some(Json::Object(meta)) => meta.clone(),
        Some(_) => return Err(WorkflowJsonError::Invalid("'meta' must be an object".to_string())),
    };
    Ok(Workflow::new(steps)?.with_meta(meta))
}

fn parse_step(step_id: &str, definition: &Json) -> Result<Step, String> {
    let obj = check_keys(definition, STEP_REQUIRED, STEP_OPTIONAL)?;
    let component = match obj.get("component") {
        Some(Json::Object(map)) => ComponentDef(map.clone()),
        _ => return Err("'component' must be an object".to_string()),
    };
    let mut step = Step::new(step_id, component);

    for (i, (name, value)) in single_entries(obj.get("parameters"), "Parameter")?
        .into_iter()
        .enumerate()
    {
        let text = value
            .as_str()
            .ok_or_else(|| format!("Parameter #{} ({:?}): value not a string", i, name))?;
        step = step.with_literal(name, text);
    }

    for (i, (name, value)) in single_entries(obj.get("inputs"), "Input")?
        .into_iter()
        .enumerate()
    {
        let reference = value.as_str().unwrap_or_default();
        let (source, output) = reference.split_once('.').ok_or_else(|| {
            format!(
                "Input #{} ({:?}): invalid input reference (should be <step>.<output>)",
                i, name
            )
        })?;
        step = step.with_connection(name, source, output);
    }

    match obj.get("position") {
        None | Some(Json::Null) => {}
        Some(Json::Array(xy)) if xy.len() == 2 => match (xy[0].as_f64(), xy[1].as_f64()) {
            (Some(x), Some(y)) => step.position = Some(Position::new(x, y)),
            _ => return Err("'position' must hold two numbers".to_string()),
        },
        Some(_) => return Err("'position' must be [x, y]".to_string()),
    }

    Ok(step)
}

/// Reads a list of one-key objects such as `[{"name": value}, ...]`.
fn single_entries<'a>(list: Option<&'a Json>, label: &str) -> Result<Vec<(&'a str, &'a Json)>, String> {
    let items = match list {
        None | Some(Json::Null) => return Ok(Vec::new()),
        Some(Json::Array(items)) => items,
        Some(_) => return Err(format!("{}s must be a list", label)),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let obj = item
                .as_object()
                .ok_or_else(|| format!("{} #{}: not a dict", label, i))?;
            if obj.len() != 1 {
                return Err(format!("{} #{}: invalid dict size (should be 1)", label, i));
            }
            let (name, value) = obj
                .iter()
                .next()
                .ok_or_else(|| format!("{} #{}: empty", label, i))?;
            Ok((name.as_str(), value))
        })
        .collect()
}

fn check_keys<'a>(value: &'a Json, required: &[&str], optional: &[&str]) -> Result<&'a Map<String, Json>, String> {
    let obj = value
        .as_object()
        .ok_or_else(|| format!("Expected an object, got {}", kind_of(value)))?;

    let unknown: Vec<&str> = obj
        .keys()
        .map(String::as_str)
        .filter(|k| !required.contains(k) && !optional.contains(k))
        .collect();
    if !unknown.is_empty() {
        return Err(format!("Unrecognized keys: {}", unknown.join(", ")));
    }

    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|k| !obj.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(format!("Missing required keys: {}", missing.join(", ")));
    }
    Ok(obj)
}

fn kind_of(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "object",
    }
}

/// Writes `workflow` in the same shape [`workflow_from_json`] reads. Only
/// string literals are representable.
pub fn workflow_to_json(workflow: &Workflow) -> Result<Json, WorkflowJsonError> {
    let mut steps = Map::new();
    for step in workflow.steps() {
        let mut parameters = Vec::new();
        let mut inputs = Vec::new();
        for (name, entries) in &step.inputs {
            for entry in entries {
                match entry {
                    StepInput::Connection(conn) => inputs.push(json!({ name.as_str(): conn.to_string() })),
                    StepInput::Literal(Value::Data(Json::String(text))) => {
                        parameters.push(json!({ name.as_str(): text }))
                    }
                    StepInput::Literal(other) => {
                        return Err(WorkflowJsonError::InvalidStep {
                            step_id: step.id.clone(),
                            message: format!(
                                "input {:?} holds a {} literal, only strings can be saved",
                                name,
                                other.kind()
                            ),
                        })
                    }
                }
            }
        }
        let position = step.position.map(|p| json!([p.x, p.y])).unwrap_or(Json::Null);
        steps.insert(
            step.id.clone(),
            json!({
                "component": step.component.0,
                "parameters": parameters,
                "inputs": inputs,
                "position": position,
            }),
        );
    }
    Ok(json!({ "steps": steps, "meta": workflow.meta() }))
}
