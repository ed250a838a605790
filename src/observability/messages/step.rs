// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-step execution events.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::fingerprint::Fingerprint;
use crate::observability::messages::StructuredLog;

/// A step is about to be invoked.
pub struct StepStarted<'a> {
    pub step_id: &'a str,
    pub fingerprint: &'a Fingerprint,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Running step '{}' ({})", self.step_id, self.fingerprint)
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::info!(
            step_id = self.step_id,
            fingerprint = %self.fingerprint,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "step",
            span_name = name,
            step_id = self.step_id,
            fingerprint = %self.fingerprint,
        )
    }
}

/// Outputs were replayed from the content store; the component is not run.
pub struct StepCacheHit<'a> {
    pub step_id: &'a str,
    pub fingerprint: &'a Fingerprint,
}

impl Display for StepCacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' loaded from cache ({})", self.step_id, self.fingerprint)
    }
}

impl StructuredLog for StepCacheHit<'_> {
    fn log(&self) {
        tracing::info!(
            step_id = self.step_id,
            fingerprint = %self.fingerprint,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("step_cache_hit", span_name = name, step_id = self.step_id)
    }
}

pub struct StepCompleted<'a> {
    pub step_id: &'a str,
    pub output_count: usize,
    pub duration: Duration,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' produced {} outputs in {:?}",
            self.step_id, self.output_count, self.duration
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            step_id = self.step_id,
            output_count = self.output_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("step_completed", span_name = name, step_id = self.step_id)
    }
}

pub struct StepFailed<'a> {
    pub step_id: &'a str,
    pub error: &'a (dyn std::error::Error + Send + Sync),
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' failed: {}", self.step_id, self.error)
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(step_id = self.step_id, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("step_failed", span_name = name, step_id = self.step_id)
    }
}
