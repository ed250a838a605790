// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Reconciling, cache-aware workflow executor.
//!
//! # Loading
//!
//! [`Executor::load_workflow`] resolves every step's component through the
//! loader chain, builds the dependency graph and computes load-time
//! fingerprints. Live component instances are then reconciled against the
//! previous load:
//!
//! * same hashable fingerprint: the instance is kept, with whatever state it
//!   holds
//! * new step, changed fingerprint or unhashable: a fresh instance replaces it
//! * step gone: its instance is disposed
//!
//! Nothing is committed until every new instance has been created, so a
//! failed load leaves the previous state untouched.
//!
//! # Execution
//!
//! [`Executor::execute`] counts outstanding connections per step and keeps a
//! ready set. For each ready step it computes a run-time fingerprint from the
//! values actually delivered to it, replays its outputs from the content store
//! on a hit, or runs the component on a tokio task. Outputs are hashed and
//! forwarded into their dependents' input slots; a dependent becomes ready
//! when its last slot is filled.
//!
//! Outputs of an unhashable step are unhashable as well, so uncacheability
//! flows downstream through run-time fingerprints.
//!
//! Every temporary file produced or replayed lives in a [`TempArena`] that is
//! dropped when `execute` returns, on every path.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::Instrument;

use super::report::{ExecutionReport, LoadReport, StepOutput};
use crate::cache::{CacheKey, ContentStore, InternalCache, JsonSerializer, Serializer};
use crate::errors::{ComponentError, ExecutionError, GraphError, StoreError};
use crate::fingerprint::{compute_step_hashes, step_fingerprint, Fingerprint, InputTokens};
use crate::graph::DependencyGraph;
use crate::observability::messages::cache::{CacheReadFailed, CacheWriteFailed};
use crate::observability::messages::engine::{
    DisposeSkipped, ExecutionCompleted, ExecutionFailed, ExecutionStarted, StepReconciled, WorkflowLoaded,
};
use crate::observability::messages::step::{StepCacheHit, StepCompleted, StepFailed, StepStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::{
    resolve_component, Component, ComponentClass, ComponentInfo, ComponentLoader, Inputs,
    StepContext,
};
use crate::value::{TempArena, Value};
use crate::workflow::{ComponentDef, StepInput, Workflow};

type Globals = serde_json::Map<String, serde_json::Value>;

/// Tuning knobs for [`Executor`].
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Ready steps dispatched concurrently. `1` runs steps one at a time.
    pub max_concurrency: usize,
    /// Parent directory for per-call temporary arenas; system default if
    /// unset.
    pub temp_dir: Option<PathBuf>,
    /// Values visible to every component through [`StepContext::global`].
    pub globals: Globals,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 1,
            temp_dir: None,
            globals: Globals::new(),
        }
    }
}

struct Instance {
    id: u64,
    fingerprint: Fingerprint,
    component: Arc<Mutex<Box<dyn Component>>>,
    outputs: BTreeMap<String, StepOutput>,
}

impl Instance {
    /// Disposes the component unless a task still holds its lock. That only
    /// happens when an `execute` future was dropped while its aborted tasks
    /// were still winding down.
    fn dispose(&self, step_id: &str) -> bool {
        match self.component.try_lock() {
            Ok(mut component) => {
                component.dispose();
                true
            }
            Err(_) => {
                DisposeSkipped { step_id }.log();
                false
            }
        }
    }
}

struct Loaded {
    workflow: Workflow,
    graph: DependencyGraph,
    hashes: BTreeMap<String, Fingerprint>,
    classes: BTreeMap<String, Arc<dyn ComponentClass>>,
}

pub struct Executor {
    loaders: Vec<Arc<dyn ComponentLoader>>,
    store: Arc<dyn ContentStore>,
    serializer: Arc<dyn Serializer>,
    options: ExecutorOptions,
    globals: Arc<Globals>,
    loaded: Option<Loaded>,
    instances: BTreeMap<String, Instance>,
    next_instance_id: u64,
}

impl Executor {
    /// `loaders` are consulted in order; the first to recognise a descriptor
    /// wins.
    pub fn new(loaders: Vec<Arc<dyn ComponentLoader>>, store: Arc<dyn ContentStore>) -> Self {
        Self {
            loaders,
            store,
            serializer: Arc::new(JsonSerializer),
            options: ExecutorOptions::default(),
            globals: Arc::new(Globals::new()),
            loaded: None,
            instances: BTreeMap::new(),
            next_instance_id: 0,
        }
    }

    pub fn with_options(mut self, options: ExecutorOptions) -> Self {
        self.globals = Arc::new(options.globals.clone());
        self.options = options;
        self
    }

    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn workflow(&self) -> Option<&Workflow> {
        self.loaded.as_ref().map(|l| &l.workflow)
    }

    pub fn graph(&self) -> Option<&DependencyGraph> {
        self.loaded.as_ref().map(|l| &l.graph)
    }

    /// Load-time fingerprints of the current workflow.
    pub fn step_hashes(&self) -> Option<&BTreeMap<String, Fingerprint>> {
        self.loaded.as_ref().map(|l| &l.hashes)
    }

    /// Identity of the live instance bound to `step_id`. Changes exactly when
    /// the instance is recreated.
    pub fn instance_id(&self, step_id: &str) -> Option<u64> {
        self.instances.get(step_id).map(|i| i.id)
    }

    /// Last outputs of `step_id`. Temporary files among them are only valid
    /// during the `execute` call that produced them.
    pub fn outputs(&self, step_id: &str) -> Option<&BTreeMap<String, StepOutput>> {
        self.instances.get(step_id).map(|i| &i.outputs)
    }

    /// Introspection through the loader chain.
    pub fn component_info(&self, def: &ComponentDef) -> Option<ComponentInfo> {
        self.loaders.iter().find_map(|l| l.get_component_info(def))
    }

    /// Loads `workflow` and reconciles component instances with the previous
    /// load.
    pub fn load_workflow(&mut self, workflow: Workflow) -> Result<LoadReport, ExecutionError> {
        let mut classes = BTreeMap::new();
        for step in workflow.steps() {
            let class = resolve_component(&self.loaders, &step.component).ok_or_else(|| {
                ExecutionError::MissingComponent {
                    step_id: step.id.clone(),
                    component: step.component.to_string(),
                }
            })?;
            classes.insert(step.id.clone(), class);
        }

        let graph = DependencyGraph::build(&workflow)?;
        let hashes = compute_step_hashes(&workflow, &classes, self.serializer.as_ref())?;

        let mut fresh: BTreeMap<String, Box<dyn Component>> = BTreeMap::new();
        for step in workflow.steps() {
            let fingerprint = fingerprint_of(&hashes, &step.id);
            if self.reusable(&step.id, fingerprint) {
                continue;
            }
            let class = classes.get(&step.id).ok_or_else(|| GraphError::UnknownStep {
                step_id: step.id.clone(),
            })?;
            match class.instantiate(&step.id, &step.component) {
                Ok(component) => {
                    fresh.insert(step.id.clone(), component);
                }
                Err(source) => {
                    for component in fresh.values_mut() {
                        component.dispose();
                    }
                    return Err(ExecutionError::InstantiationFailed {
                        step_id: step.id.clone(),
                        source,
                    });
                }
            }
        }

        let mut report = LoadReport::default();
        let mut previous = std::mem::take(&mut self.instances);
        for step in workflow.steps() {
            let fingerprint = fingerprint_of(&hashes, &step.id).clone();
            let fingerprint_text = fingerprint.to_string();
            match fresh.remove(&step.id) {
                None => {
                    if let Some(instance) = previous.remove(&step.id) {
                        StepReconciled {
                            step_id: &step.id,
                            decision: "kept",
                            fingerprint: &fingerprint_text,
                        }
                        .log();
                        report.kept.push(step.id.clone());
                        self.instances.insert(step.id.clone(), instance);
                    }
                }
                Some(component) => {
                    if let Some(old) = previous.remove(&step.id) {
                        old.dispose(&step.id);
                        report.disposed.push(step.id.clone());
                    }
                    StepReconciled {
                        step_id: &step.id,
                        decision: "created",
                        fingerprint: &fingerprint_text,
                    }
                    .log();
                    let id = self.next_instance_id;
                    self.next_instance_id += 1;
                    self.instances.insert(
                        step.id.clone(),
                        Instance {
                            id,
                            fingerprint,
                            component: Arc::new(Mutex::new(component)),
                            outputs: BTreeMap::new(),
                        },
                    );
                    report.created.push(step.id.clone());
                }
            }
        }
        for (step_id, old) in previous {
            old.dispose(&step_id);
            report.disposed.push(step_id);
        }

        WorkflowLoaded {
            step_count: workflow.len(),
            kept: report.kept.len(),
            created: report.created.len(),
            disposed: report.disposed.len(),
        }
        .log();

        self.loaded = Some(Loaded {
            workflow,
            graph,
            hashes,
            classes,
        });
        Ok(report)
    }

    fn reusable(&self, step_id: &str, fingerprint: &Fingerprint) -> bool {
        !fingerprint.is_unhashable()
            && self
                .instances
                .get(step_id)
                .map_or(false, |instance| instance.fingerprint == *fingerprint)
    }

    /// Runs every step, or only the dependency closure of `sinks`.
    pub async fn execute(&mut self, sinks: Option<&[&str]>) -> Result<ExecutionReport, ExecutionError> {
        let loaded = self.loaded.as_ref().ok_or(ExecutionError::NotLoaded)?;
        let working: BTreeSet<String> = match sinks {
            Some(sinks) => loaded.graph.closure(sinks.iter().copied())?,
            None => loaded.workflow.step_ids().cloned().collect(),
        };
        let max_concurrency = self.options.max_concurrency.max(1);

        let started_msg = ExecutionStarted {
            step_count: working.len(),
            max_concurrency,
        };
        started_msg.log();
        let span = started_msg.span("execute");
        let started = Instant::now();

        let arena = TempArena::new(self.options.temp_dir.as_deref()).map_err(ExecutionError::TempDir)?;
        let mut tasks: JoinSet<StepOutcome> = JoinSet::new();

        let mut run = Run::new(
            loaded,
            &working,
            &mut self.instances,
            self.store.clone(),
            self.serializer.clone(),
            self.globals.clone(),
            arena.path().to_path_buf(),
        );
        let result = match run.drive(&mut tasks, max_concurrency).instrument(span).await {
            Ok(()) => run.finish(),
            Err(error) => Err(error),
        };

        if result.is_err() {
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
        drop(arena);

        match &result {
            Ok(report) => ExecutionCompleted {
                executed: report.executed.len(),
                cached: report.cached.len(),
                duration: started.elapsed(),
            }
            .log(),
            Err(error) => ExecutionFailed { error }.log(),
        }
        result
    }
}

static UNHASHABLE: Fingerprint = Fingerprint::Unhashable;

fn fingerprint_of<'a>(hashes: &'a BTreeMap<String, Fingerprint>, step_id: &str) -> &'a Fingerprint {
    hashes.get(step_id).unwrap_or(&UNHASHABLE)
}

/// A component invocation ready to be spawned.
struct Task {
    component: Arc<Mutex<Box<dyn Component>>>,
    inputs: Inputs,
    ctx: StepContext,
}

struct StepOutcome {
    step_id: String,
    fingerprint: Fingerprint,
    result: Result<BTreeMap<String, Value>, ComponentError>,
    duration: Duration,
}

impl Task {
    async fn run(self, step_id: String, fingerprint: Fingerprint) -> StepOutcome {
        let Task {
            component,
            inputs,
            mut ctx,
        } = self;
        let started = Instant::now();
        let result = {
            let mut component = component.lock().await;
            component.execute(inputs, &mut ctx).await
        };
        StepOutcome {
            step_id,
            fingerprint,
            result: result.map(|()| ctx.into_outputs()),
            duration: started.elapsed(),
        }
    }
}

enum Prepared {
    Cached(BTreeMap<String, Value>),
    Run(Task),
}

/// State of one `execute` call.
struct Run<'a> {
    loaded: &'a Loaded,
    working: &'a BTreeSet<String>,
    instances: &'a mut BTreeMap<String, Instance>,
    store: Arc<dyn ContentStore>,
    serializer: Arc<dyn Serializer>,
    globals: Arc<Globals>,
    temp_dir: PathBuf,
    /// Step -> port -> one slot per declared entry.
    slots: BTreeMap<String, BTreeMap<String, Vec<Option<StepOutput>>>>,
    pending: BTreeMap<String, usize>,
    ready: BTreeSet<String>,
    report: ExecutionReport,
}

impl<'a> Run<'a> {
    fn new(
        loaded: &'a Loaded,
        working: &'a BTreeSet<String>,
        instances: &'a mut BTreeMap<String, Instance>,
        store: Arc<dyn ContentStore>,
        serializer: Arc<dyn Serializer>,
        globals: Arc<Globals>,
        temp_dir: PathBuf,
    ) -> Self {
        let mut slots = BTreeMap::new();
        let mut pending = BTreeMap::new();
        let mut ready = BTreeSet::new();

        for step in loaded.workflow.steps().filter(|s| working.contains(&s.id)) {
            let mut outstanding = 0;
            let mut ports = BTreeMap::new();
            for (port, entries) in &step.inputs {
                let filled: Vec<Option<StepOutput>> = entries
                    .iter()
                    .map(|entry| match entry {
                        StepInput::Literal(value) => Some(StepOutput {
                            value: value.clone(),
                            fingerprint: serializer.hash(value),
                        }),
                        StepInput::Connection(_) => {
                            outstanding += 1;
                            None
                        }
                    })
                    .collect();
                ports.insert(port.clone(), filled);
            }
            if outstanding == 0 {
                ready.insert(step.id.clone());
            }
            slots.insert(step.id.clone(), ports);
            pending.insert(step.id.clone(), outstanding);
        }

        Self {
            loaded,
            working,
            instances,
            store,
            serializer,
            globals,
            temp_dir,
            slots,
            pending,
            ready,
            report: ExecutionReport::default(),
        }
    }

    async fn drive(
        &mut self,
        tasks: &mut JoinSet<StepOutcome>,
        max_concurrency: usize,
    ) -> Result<(), ExecutionError> {
        let mut running: BTreeSet<String> = BTreeSet::new();
        loop {
            while running.len() < max_concurrency {
                let Some(step_id) = self.ready.pop_first() else {
                    break;
                };
                let (fingerprint, prepared) = self.prepare(&step_id)?;
                match prepared {
                    Prepared::Cached(outputs) => {
                        StepCacheHit {
                            step_id: &step_id,
                            fingerprint: &fingerprint,
                        }
                        .log();
                        self.deliver(&step_id, &fingerprint, outputs)?;
                        self.report.cached.push(step_id);
                    }
                    Prepared::Run(task) => {
                        let msg = StepStarted {
                            step_id: &step_id,
                            fingerprint: &fingerprint,
                        };
                        msg.log();
                        let span = msg.span("step");
                        running.insert(step_id.clone());
                        tasks.spawn(task.run(step_id, fingerprint).instrument(span));
                    }
                }
            }

            let Some(joined) = tasks.join_next().await else {
                return Ok(());
            };
            let outcome = joined.map_err(|source| ExecutionError::TaskPanicked {
                running: running.iter().cloned().collect(),
                source,
            })?;
            running.remove(&outcome.step_id);

            match outcome.result {
                Ok(outputs) => {
                    StepCompleted {
                        step_id: &outcome.step_id,
                        output_count: outputs.len(),
                        duration: outcome.duration,
                    }
                    .log();
                    self.persist(&outcome.fingerprint, &outputs);
                    self.deliver(&outcome.step_id, &outcome.fingerprint, outputs)?;
                    self.report.executed.push(outcome.step_id);
                }
                Err(source) => {
                    StepFailed {
                        step_id: &outcome.step_id,
                        error: source.as_ref(),
                    }
                    .log();
                    return Err(ExecutionError::StepFailed {
                        step_id: outcome.step_id,
                        source,
                    });
                }
            }
        }
    }

    /// Resolves inputs, checks arity, computes the run-time fingerprint and
    /// consults the cache.
    fn prepare(&mut self, step_id: &str) -> Result<(Fingerprint, Prepared), ExecutionError> {
        let loaded: &'a Loaded = self.loaded;
        let unknown = || GraphError::UnknownStep {
            step_id: step_id.to_string(),
        };
        let step = loaded.workflow.step(step_id).ok_or_else(unknown)?;
        let class = loaded.classes.get(step_id).ok_or_else(unknown)?;
        let info = class.info();

        let ports = self.slots.remove(step_id).unwrap_or_default();
        let mut tokens = InputTokens::new();
        let mut values = BTreeMap::new();
        for (port, slots) in ports {
            if let Some(declared) = info.input(&port) {
                if !declared.multiple && slots.len() > 1 {
                    return Err(ExecutionError::InputArity {
                        step_id: step_id.to_string(),
                        input_name: port,
                        count: slots.len(),
                    });
                }
            }

            tokens.port(&port);
            let entries = step.inputs.get(&port).map(Vec::as_slice).unwrap_or(&[]);
            let mut list = Vec::with_capacity(slots.len());
            for (entry, slot) in entries.iter().zip(slots) {
                let delivered = slot.ok_or_else(|| ExecutionError::Stuck {
                    count: 1,
                    steps: vec![step_id.to_string()],
                })?;
                match entry {
                    StepInput::Literal(_) => tokens.push_literal(&port, &delivered.fingerprint),
                    StepInput::Connection(conn) => {
                        tokens.push_connection(&port, &delivered.fingerprint, &conn.source_output_name)
                    }
                }
                list.push(delivered.value);
            }
            values.insert(port, list);
        }

        let fingerprint = step_fingerprint(class.as_ref(), &step.component, &tokens);
        if let Some(outputs) = self.lookup(&fingerprint) {
            return Ok((fingerprint, Prepared::Cached(outputs)));
        }

        let instance = self
            .instances
            .get(step_id)
            .ok_or_else(|| ExecutionError::MissingComponent {
                step_id: step_id.to_string(),
                component: step.component.to_string(),
            })?;
        let internal_cache =
            InternalCache::new(self.store.clone(), fingerprint.clone(), self.temp_dir.clone());
        let ctx = StepContext::new(step_id, self.temp_dir.clone(), self.globals.clone(), internal_cache);
        let task = Task {
            component: instance.component.clone(),
            inputs: Inputs::new(values),
            ctx,
        };
        Ok((fingerprint, Prepared::Run(task)))
    }

    fn lookup(&self, fingerprint: &Fingerprint) -> Option<BTreeMap<String, Value>> {
        let key = CacheKey::outputs(fingerprint)?;
        let error = match self.store.get(&key, &self.temp_dir) {
            Ok(Value::Map(outputs)) => return Some(outputs),
            Ok(other) => StoreError::Malformed(other.kind()),
            Err(StoreError::NotFound) => return None,
            Err(error) => error,
        };
        CacheReadFailed {
            key: &key,
            error: &error,
        }
        .log();
        None
    }

    fn persist(&self, fingerprint: &Fingerprint, outputs: &BTreeMap<String, Value>) {
        let Some(key) = CacheKey::outputs(fingerprint) else {
            return;
        };
        if let Err(error) = self.store.put(&key, &Value::Map(outputs.clone())) {
            CacheWriteFailed {
                key: &key,
                error: &error,
            }
            .log();
        }
    }

    /// Hashes `outputs`, records them on the instance and fills the input
    /// slots of every dependent in the working set.
    fn deliver(
        &mut self,
        step_id: &str,
        fingerprint: &Fingerprint,
        outputs: BTreeMap<String, Value>,
    ) -> Result<(), ExecutionError> {
        let loaded: &'a Loaded = self.loaded;
        let working: &'a BTreeSet<String> = self.working;

        let hashed: BTreeMap<String, StepOutput> = outputs
            .into_iter()
            .map(|(name, value)| {
                let fingerprint = if fingerprint.is_unhashable() {
                    Fingerprint::Unhashable
                } else {
                    self.serializer.hash(&value)
                };
                (name, StepOutput { value, fingerprint })
            })
            .collect();

        for dependent in loaded.graph.dependents_of(step_id) {
            if !working.contains(&dependent.step_id) {
                continue;
            }
            let output = hashed
                .get(&dependent.output_name)
                .ok_or_else(|| ExecutionError::MissingOutput {
                    step_id: step_id.to_string(),
                    output_name: dependent.output_name.clone(),
                    dependent: dependent.step_id.clone(),
                })?;
            if let Some(slot) = self
                .slots
                .get_mut(&dependent.step_id)
                .and_then(|ports| ports.get_mut(&dependent.input_name))
                .and_then(|slots| slots.get_mut(dependent.index))
            {
                *slot = Some(output.clone());
            }
            if let Some(count) = self.pending.get_mut(&dependent.step_id) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.ready.insert(dependent.step_id.clone());
                }
            }
        }

        if let Some(instance) = self.instances.get_mut(step_id) {
            instance.outputs = hashed;
        }
        Ok(())
    }

    fn finish(self) -> Result<ExecutionReport, ExecutionError> {
        let done: BTreeSet<&String> = self.report.steps().collect();
        let stuck: Vec<String> = self
            .working
            .iter()
            .filter(|id| !done.contains(id))
            .cloned()
            .collect();
        if !stuck.is_empty() {
            return Err(ExecutionError::Stuck {
                count: stuck.len(),
                steps: stuck,
            });
        }
        Ok(self.report)
    }
}
