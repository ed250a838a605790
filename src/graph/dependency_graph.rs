// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::GraphError;
use crate::workflow::Workflow;

/// One recorded edge: `step_id`'s input `input_name` (entry `index`) reads
/// `output_name` of the step that owns this record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Dependent {
    pub output_name: String,
    pub step_id: String,
    pub input_name: String,
    pub index: usize,
}

impl Dependent {
    pub fn new(output_name: &str, step_id: &str, input_name: &str, index: usize) -> Self {
        Self {
            output_name: output_name.to_string(),
            step_id: step_id.to_string(),
            input_name: input_name.to_string(),
            index,
        }
    }
}

/// Forward and backward adjacency of a workflow's connections.
///
/// Every step has an entry in both maps, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<String, BTreeSet<String>>,
    dependents: BTreeMap<String, Vec<Dependent>>,
}

impl DependencyGraph {
    /// Builds the graph in one pass over every input entry. A connection to a
    /// step outside the workflow fails immediately.
    pub fn build(workflow: &Workflow) -> Result<Self, GraphError> {
        let mut dependencies: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut dependents: BTreeMap<String, Vec<Dependent>> = BTreeMap::new();

        for id in workflow.step_ids() {
            dependencies.insert(id.clone(), BTreeSet::new());
            dependents.insert(id.clone(), Vec::new());
        }

        for step in workflow.steps() {
            for (input_name, index, conn) in step.connections() {
                let Some(edges) = dependents.get_mut(&conn.source_step_id) else {
                    return Err(GraphError::MissingReference {
                        step_id: step.id.clone(),
                        input_name: input_name.to_string(),
                        source_step_id: conn.source_step_id.clone(),
                    });
                };
                edges.push(Dependent::new(
                    &conn.source_output_name,
                    &step.id,
                    input_name,
                    index,
                ));
                dependencies
                    .entry(step.id.clone())
                    .or_default()
                    .insert(conn.source_step_id.clone());
            }
        }

        Ok(Self {
            dependencies,
            dependents,
        })
    }

    pub fn dependencies(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.dependencies
    }

    pub fn dependents(&self) -> &BTreeMap<String, Vec<Dependent>> {
        &self.dependents
    }

    pub fn dependencies_of(&self, step_id: &str) -> impl Iterator<Item = &String> {
        self.dependencies.get(step_id).into_iter().flatten()
    }

    pub fn dependents_of(&self, step_id: &str) -> &[Dependent] {
        self.dependents.get(step_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Steps with no dependencies.
    pub fn sources(&self) -> BTreeSet<String> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Steps that feed no other step.
    pub fn sinks(&self) -> BTreeSet<String> {
        self.dependents
            .iter()
            .filter(|(_, edges)| edges.is_empty())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// `sinks` plus everything they transitively depend on.
    pub fn closure<'a>(
        &self,
        sinks: impl IntoIterator<Item = &'a str>,
    ) -> Result<BTreeSet<String>, GraphError> {
        let mut visited = BTreeSet::new();
        let mut stack = Vec::new();
        for sink in sinks {
            if !self.dependencies.contains_key(sink) {
                return Err(GraphError::UnknownStep {
                    step_id: sink.to_string(),
                });
            }
            stack.push(sink.to_string());
        }
        while let Some(id) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            for dep in self.dependencies_of(&id) {
                if !visited.contains(dep) {
                    stack.push(dep.clone());
                }
            }
        }
        Ok(visited)
    }
}
