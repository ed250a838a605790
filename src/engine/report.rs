// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::fingerprint::Fingerprint;
use crate::value::Value;

/// Outcome of `Executor::load_workflow`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Steps whose instance survived the reload.
    pub kept: Vec<String>,
    /// Steps that received a fresh instance.
    pub created: Vec<String>,
    /// Steps whose previous instance was disposed.
    pub disposed: Vec<String>,
}

/// Outcome of a successful `Executor::execute`, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub executed: Vec<String>,
    pub cached: Vec<String>,
}

impl ExecutionReport {
    pub fn completed(&self) -> usize {
        self.executed.len() + self.cached.len()
    }

    /// Every step that ran or was served from cache.
    pub fn steps(&self) -> impl Iterator<Item = &String> {
        self.executed.iter().chain(self.cached.iter())
    }
}

/// A named output of a step together with the hash of its value.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub value: Value,
    pub fingerprint: Fingerprint,
}
