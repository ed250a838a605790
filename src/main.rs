// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use cacheflow::backends::ComponentRegistry;
use cacheflow::config::{load_and_validate_config, EngineConfig, RuntimeBuilder};
use cacheflow::traits::ComponentLoader;
use cacheflow::value::Value;
use cacheflow::workflow::{workflow_from_json, Workflow, WorkflowController};

const USAGE: &str = "Usage: cacheflow run <workflow.json|workflow.yaml> [--config FILE] [--sink STEP]...";

#[derive(Debug, PartialEq)]
struct RunArgs {
    workflow: PathBuf,
    config: Option<PathBuf>,
    sinks: Vec<String>,
}

fn parse_args(args: &[String]) -> Result<RunArgs> {
    let mut iter = args.iter();
    match iter.next().map(String::as_str) {
        Some("run") => {}
        Some(other) => bail!("unknown command '{}'", other),
        None => bail!("missing command"),
    }

    let mut workflow = None;
    let mut config = None;
    let mut sinks = Vec::new();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let value = iter.next().context("--config needs a file")?;
                config = Some(PathBuf::from(value));
            }
            "--sink" => {
                let value = iter.next().context("--sink needs a step id")?;
                sinks.push(value.clone());
            }
            flag if flag.starts_with("--") => bail!("unknown option '{}'", flag),
            path if workflow.is_none() => workflow = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{}'", extra),
        }
    }

    Ok(RunArgs {
        workflow: workflow.context("missing workflow file")?,
        config,
        sinks,
    })
}

fn read_workflow(path: &Path) -> Result<Workflow> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?,
        _ => serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?,
    };
    workflow_from_json(&document).with_context(|| format!("loading workflow {}", path.display()))
}

/// Printable form of an output. Temporary files are gone once `execute`
/// returns, so only their kind is shown.
fn describe(value: &Value) -> String {
    match value {
        Value::TempFile(_) | Value::Opaque(_) => format!("<{}>", value.kind()),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(describe).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(entries) => {
            let entries: Vec<String> = entries
                .iter()
                .map(|(key, item)| format!("{:?}: {}", key, describe(item)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        Value::Data(data) => data.to_string(),
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            load_and_validate_config(path).with_context(|| format!("loading config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    let workflow = read_workflow(&args.workflow)?;

    let registry: Arc<dyn ComponentLoader> = Arc::new(ComponentRegistry::with_builtins());
    let executor = RuntimeBuilder::from_config(&config, vec![registry]).context("building runtime")?;
    let mut controller = WorkflowController::new(workflow, executor);

    let sinks: Vec<&str> = args.sinks.iter().map(String::as_str).collect();
    let sinks = if sinks.is_empty() { None } else { Some(sinks.as_slice()) };

    println!("🚀 Running {} ({} steps)", args.workflow.display(), controller.current_workflow().len());
    let start = Instant::now();
    let report = controller.execute(sinks).await.context("workflow execution failed")?;

    for step_id in &report.executed {
        println!("  ▶ {} executed", step_id);
    }
    for step_id in &report.cached {
        println!("  ♻ {} cached", step_id);
    }
    for step_id in report.steps() {
        if let Some(outputs) = controller.executor().outputs(step_id) {
            for (name, output) in outputs {
                println!("    {}.{} = {} [{}]", step_id, name, describe(&output.value), output.fingerprint);
            }
        }
    }
    println!(
        "✅ {} steps completed in {:.2?} ({} from cache)",
        report.completed(),
        start.elapsed(),
        report.cached.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(&args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}
