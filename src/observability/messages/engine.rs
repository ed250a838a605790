// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow loading and execution lifecycle events.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::observability::messages::StructuredLog;

/// A workflow was loaded and its instances reconciled.
///
/// # Log Level
/// `info!`
pub struct WorkflowLoaded {
    pub step_count: usize,
    pub kept: usize,
    pub created: usize,
    pub disposed: usize,
}

impl Display for WorkflowLoaded {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded workflow with {} steps: {} kept, {} created, {} disposed",
            self.step_count, self.kept, self.created, self.disposed
        )
    }
}

impl StructuredLog for WorkflowLoaded {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            kept = self.kept,
            created = self.created,
            disposed = self.disposed,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow_loaded",
            span_name = name,
            step_count = self.step_count,
        )
    }
}

/// Reconciliation decision for a single step.
///
/// # Log Level
/// `debug!`
pub struct StepReconciled<'a> {
    pub step_id: &'a str,
    pub decision: &'a str,
    pub fingerprint: &'a str,
}

impl Display for StepReconciled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' {} ({})", self.step_id, self.decision, self.fingerprint)
    }
}

impl StructuredLog for StepReconciled<'_> {
    fn log(&self) {
        tracing::debug!(
            step_id = self.step_id,
            decision = self.decision,
            fingerprint = self.fingerprint,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("step_reconciled", span_name = name, step_id = self.step_id)
    }
}

/// A superseded or removed instance could not be disposed because a task
/// still held it.
///
/// # Log Level
/// `warn!`
pub struct DisposeSkipped<'a> {
    pub step_id: &'a str,
}

impl Display for DisposeSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' instance still in use, dispose skipped", self.step_id)
    }
}

impl StructuredLog for DisposeSkipped<'_> {
    fn log(&self) {
        tracing::warn!(step_id = self.step_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("dispose_skipped", span_name = name, step_id = self.step_id)
    }
}

/// Execution started.
///
/// # Log Level
/// `info!`
///
/// # Example
/// ```
/// use cacheflow::observability::messages::engine::ExecutionStarted;
///
/// let msg = ExecutionStarted {
///     step_count: 3,
///     max_concurrency: 2,
/// };
/// assert_eq!(msg.to_string(), "Executing 3 steps, max_concurrency=2");
/// ```
pub struct ExecutionStarted {
    pub step_count: usize,
    pub max_concurrency: usize,
}

impl Display for ExecutionStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing {} steps, max_concurrency={}",
            self.step_count, self.max_concurrency
        )
    }
}

impl StructuredLog for ExecutionStarted {
    fn log(&self) {
        tracing::info!(
            step_count = self.step_count,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            step_count = self.step_count,
            max_concurrency = self.max_concurrency,
        )
    }
}

/// Execution completed successfully.
///
/// # Log Level
/// `info!`
pub struct ExecutionCompleted {
    pub executed: usize,
    pub cached: usize,
    pub duration: Duration,
}

impl Display for ExecutionCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution completed: {} executed, {} from cache in {:?}",
            self.executed, self.cached, self.duration
        )
    }
}

impl StructuredLog for ExecutionCompleted {
    fn log(&self) {
        tracing::info!(
            executed = self.executed,
            cached = self.cached,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_completed",
            span_name = name,
            executed = self.executed,
            cached = self.cached,
            duration = ?self.duration,
        )
    }
}

/// Execution aborted.
///
/// # Log Level
/// `error!`
pub struct ExecutionFailed<'a> {
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Execution failed: {}", self.error)
    }
}

impl StructuredLog for ExecutionFailed<'_> {
    fn log(&self) {
        tracing::error!(error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("execution_failed", span_name = name, error = %self.error)
    }
}
