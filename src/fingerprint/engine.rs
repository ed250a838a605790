// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Load-time fingerprint computation.
//!
//! Depth-first over connections with an explicit stack: `Enter` pushes a step
//! onto the in-progress path and schedules its upstream steps, `Exit` hashes it
//! once every upstream fingerprint is known. Reaching a step that is still in
//! progress means the connections form a cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::{step_fingerprint, Fingerprint, InputTokens};
use crate::cache::Serializer;
use crate::errors::GraphError;
use crate::traits::ComponentClass;
use crate::workflow::{StepInput, Workflow};

enum Frame<'a> {
    Enter(&'a str),
    Exit(&'a str),
}

/// Computes the fingerprint of every step in `workflow`.
///
/// `classes` maps each step id to its resolved component class; steps are
/// visited in identifier order so every step is covered, including cycles
/// that no sink reaches.
pub fn compute_step_hashes(
    workflow: &Workflow,
    classes: &BTreeMap<String, Arc<dyn ComponentClass>>,
    serializer: &dyn Serializer,
) -> Result<BTreeMap<String, Fingerprint>, GraphError> {
    let mut hashes: BTreeMap<String, Fingerprint> = BTreeMap::new();
    let mut in_progress: BTreeSet<&str> = BTreeSet::new();
    let mut path: Vec<&str> = Vec::new();

    for root in workflow.step_ids() {
        if hashes.contains_key(root.as_str()) {
            continue;
        }
        let mut stack = vec![Frame::Enter(root.as_str())];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => {
                    if hashes.contains_key(id) {
                        continue;
                    }
                    if in_progress.contains(id) {
                        let start = path.iter().position(|p| *p == id).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            path[start..].iter().map(|s| s.to_string()).collect();
                        cycle.push(id.to_string());
                        return Err(GraphError::Cycle { cycle });
                    }
                    let step = workflow.step(id).ok_or_else(|| GraphError::UnknownStep {
                        step_id: id.to_string(),
                    })?;

                    in_progress.insert(id);
                    path.push(id);
                    stack.push(Frame::Exit(id));

                    for (input_name, _, conn) in step.connections() {
                        let source = conn.source_step_id.as_str();
                        if !workflow.contains(source) {
                            return Err(GraphError::MissingReference {
                                step_id: id.to_string(),
                                input_name: input_name.to_string(),
                                source_step_id: source.to_string(),
                            });
                        }
                        if !hashes.contains_key(source) {
                            stack.push(Frame::Enter(source));
                        }
                    }
                }
                Frame::Exit(id) => {
                    let step = workflow.step(id).ok_or_else(|| GraphError::UnknownStep {
                        step_id: id.to_string(),
                    })?;
                    let class = classes.get(id).ok_or_else(|| GraphError::UnknownStep {
                        step_id: id.to_string(),
                    })?;

                    let mut tokens = InputTokens::new();
                    for (port, entries) in &step.inputs {
                        tokens.port(port);
                        for entry in entries {
                            match entry {
                                StepInput::Literal(value) => {
                                    tokens.push_literal(port, &serializer.hash(value))
                                }
                                StepInput::Connection(conn) => {
                                    let upstream = hashes
                                        .get(&conn.source_step_id)
                                        .cloned()
                                        .unwrap_or(Fingerprint::Unhashable);
                                    tokens.push_connection(port, &upstream, &conn.source_output_name)
                                }
                            }
                        }
                    }

                    let fingerprint = step_fingerprint(class.as_ref(), &step.component, &tokens);
                    in_progress.remove(id);
                    path.pop();
                    hashes.insert(id.to_string(), fingerprint);
                }
            }
        }
    }

    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{stub_classes, MockClass};
    use crate::cache::JsonSerializer;
    use crate::value::Value;
    use crate::workflow::{ComponentDef, Step};

    fn hashes_for(workflow: &Workflow) -> Result<BTreeMap<String, Fingerprint>, GraphError> {
        let classes = stub_classes(workflow, Arc::new(MockClass::new("mock")));
        compute_step_hashes(workflow, &classes, &JsonSerializer)
    }

    fn chain(literal: &str) -> Workflow {
        Workflow::new(vec![
            Step::new("one", ComponentDef::new("mock")).with_literal("i", literal),
            Step::new("two", ComponentDef::new("mock")).with_connection("i", "one", "o"),
            Step::new("three", ComponentDef::new("mock")).with_connection("i", "two", "o"),
        ])
        .unwrap()
    }

    #[test]
    fn test_hashes_are_deterministic() {
        let first = hashes_for(&chain("v")).unwrap();
        let second = hashes_for(&chain("v")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert!(first.values().all(|f| !f.is_unhashable()));
    }

    #[test]
    fn test_literal_change_propagates_downstream() {
        let before = hashes_for(&chain("v")).unwrap();
        let after = hashes_for(&chain("x")).unwrap();
        for id in ["one", "two", "three"] {
            assert_ne!(before[id], after[id], "{} should change", id);
        }
    }

    #[test]
    fn test_repointing_output_changes_hash() {
        let a = Workflow::new(vec![
            Step::new("one", ComponentDef::new("mock")),
            Step::new("two", ComponentDef::new("mock")).with_connection("i", "one", "o"),
        ])
        .unwrap();
        let b = Workflow::new(vec![
            Step::new("one", ComponentDef::new("mock")),
            Step::new("two", ComponentDef::new("mock")).with_connection("i", "one", "other"),
        ])
        .unwrap();
        let ha = hashes_for(&a).unwrap();
        let hb = hashes_for(&b).unwrap();
        assert_eq!(ha["one"], hb["one"]);
        assert_ne!(ha["two"], hb["two"]);
    }

    #[test]
    fn test_position_does_not_affect_hash() {
        let a = Workflow::new(vec![Step::new("one", ComponentDef::new("mock")).with_literal("i", "v")]).unwrap();
        let b = Workflow::new(vec![Step::new("one", ComponentDef::new("mock"))
            .with_literal("i", "v")
            .with_position(10.0, -3.5)])
        .unwrap();
        assert_eq!(hashes_for(&a).unwrap(), hashes_for(&b).unwrap());
    }

    #[test]
    fn test_value_order_within_port_matters() {
        let a = Workflow::new(vec![Step::new("s", ComponentDef::new("mock"))
            .with_literal("i", "a")
            .with_literal("i", "b")])
        .unwrap();
        let b = Workflow::new(vec![Step::new("s", ComponentDef::new("mock"))
            .with_literal("i", "b")
            .with_literal("i", "a")])
        .unwrap();
        assert_ne!(hashes_for(&a).unwrap()["s"], hashes_for(&b).unwrap()["s"]);
    }

    #[test]
    fn test_unhashable_literal_propagates() {
        let workflow = Workflow::new(vec![
            Step::new("a", ComponentDef::new("mock")).with_literal("i", Value::opaque(7u8)),
            Step::new("b", ComponentDef::new("mock")).with_connection("i", "a", "o"),
            Step::new("c", ComponentDef::new("mock")).with_connection("i", "b", "o"),
            Step::new("d", ComponentDef::new("mock")).with_literal("i", "fine"),
        ])
        .unwrap();
        let hashes = hashes_for(&workflow).unwrap();
        assert!(hashes["a"].is_unhashable());
        assert!(hashes["b"].is_unhashable());
        assert!(hashes["c"].is_unhashable());
        assert!(!hashes["d"].is_unhashable());
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let workflow = Workflow::new(vec![
            Step::new("a", ComponentDef::new("mock")).with_connection("i", "c", "o"),
            Step::new("b", ComponentDef::new("mock")).with_connection("i", "a", "o"),
            Step::new("c", ComponentDef::new("mock")).with_connection("i", "b", "o"),
        ])
        .unwrap();
        match hashes_for(&workflow) {
            Err(GraphError::Cycle { cycle }) => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 4);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let workflow =
            Workflow::new(vec![Step::new("a", ComponentDef::new("mock")).with_connection("i", "a", "o")]).unwrap();
        assert!(matches!(
            hashes_for(&workflow),
            Err(GraphError::Cycle { cycle }) if cycle == vec!["a".to_string(), "a".to_string()]
        ));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let workflow = Workflow::new(vec![
            Step::new("top", ComponentDef::new("mock")),
            Step::new("left", ComponentDef::new("mock")).with_connection("i", "top", "o"),
            Step::new("right", ComponentDef::new("mock")).with_connection("i", "top", "o"),
            Step::new("bottom", ComponentDef::new("mock"))
                .with_connection("l", "left", "o")
                .with_connection("r", "right", "o"),
        ])
        .unwrap();
        assert_eq!(hashes_for(&workflow).unwrap().len(), 4);
    }

    #[test]
    fn test_missing_reference() {
        let workflow =
            Workflow::new(vec![Step::new("a", ComponentDef::new("mock")).with_connection("i", "ghost", "o")]).unwrap();
        assert!(matches!(
            hashes_for(&workflow),
            Err(GraphError::MissingReference { source_step_id, .. }) if source_step_id == "ghost"
        ));
    }
}
