use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dealflow_config::WorkflowDef;
use dealflow_runtime::Runtime;
use dealflow_steps::{StaticCatalog, StepRegistry};
use dealflow_store::{ExecutionStore, SqliteStore};
use dealflow_workflow::Workflow;

mod config;
mod telemetry;

use config::Config;

/// Dealflow - run visual-editor workflows against deal data
#[derive(Parser)]
#[command(name = "dealflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.dealflow)
  #[arg(long, global = true, env = "DEALFLOW_DATA_DIR")]
  data_dir: Option<PathBuf>,

  /// Database for execution records (default: sqlite file in the data directory)
  #[arg(long, global = true, env = "DEALFLOW_DATABASE_URL")]
  database_url: Option<String>,

  /// Do not write an execution record
  #[arg(long, global = true)]
  no_record: bool,

  /// Log filter used when RUST_LOG is unset
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow or a single node
  Run {
    #[command(subcommand)]
    target: RunTarget,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire workflow. The trigger payload is read from stdin.
  Workflow {
    /// Path to the workflow JSON file
    workflow_file: PathBuf,

    /// Plugin action catalog (JSON array of {id, label})
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Reject workflows with duplicate node ids or dangling edges
    #[arg(long)]
    strict: bool,
  },

  /// Run a single node. Stdin holds a map of node id to output data.
  Node {
    /// Path to the workflow JSON file
    workflow_file: PathBuf,

    /// The node ID to execute
    node_id: String,

    /// Plugin action catalog (JSON array of {id, label})
    #[arg(long)]
    catalog: Option<PathBuf>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  telemetry::init_tracing(&cli.log_level)?;
  let config = Config::resolve(cli.data_dir, cli.database_url, cli.no_record)?;

  match cli.command {
    Some(Commands::Run { target }) => {
      let rt = tokio::runtime::Runtime::new()?;
      match target {
        RunTarget::Workflow {
          workflow_file,
          catalog,
          strict,
        } => rt.block_on(run_workflow(config, workflow_file, catalog, strict)),
        RunTarget::Node {
          workflow_file,
          node_id,
          catalog,
        } => rt.block_on(run_node(workflow_file, node_id, catalog)),
      }
    }
    None => {
      println!("dealflow - use --help to see available commands");
      Ok(())
    }
  }
}

async fn run_workflow(
  config: Config,
  workflow_file: PathBuf,
  catalog: Option<PathBuf>,
  strict: bool,
) -> Result<()> {
  let workflow = load_workflow(&workflow_file).await?;
  info!(workflow_id = %workflow.id(), name = %workflow.name(), "workflow_loaded");

  let payload = match read_payload_from_stdin()? {
    Value::Object(map) => map,
    Value::Null => Map::new(),
    other => bail!("trigger payload must be a JSON object, got {}", other),
  };

  let mut runtime = Runtime::new(workflow, StepRegistry::with_builtins())
    .with_catalog(Arc::new(load_catalog(catalog.as_deref()).await?));
  if strict {
    runtime.validate().context("workflow failed validation")?;
  }
  if let Some(store) = open_store(&config).await {
    runtime = runtime.with_store(store);
  }

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt received, cancelling");
      on_interrupt.cancel();
    }
  });

  let result = runtime
    .invoke(Some(payload), cancel)
    .await
    .context("workflow execution failed")?;

  println!("{}", serde_json::to_string_pretty(&result)?);
  if !result.success {
    std::process::exit(1);
  }
  Ok(())
}

async fn run_node(workflow_file: PathBuf, node_id: String, catalog: Option<PathBuf>) -> Result<()> {
  let workflow = load_workflow(&workflow_file).await?;
  let payload = read_payload_from_stdin()?;

  let runtime = Runtime::new(workflow, StepRegistry::with_builtins())
    .with_catalog(Arc::new(load_catalog(catalog.as_deref()).await?));
  let result = runtime
    .invoke_node(&node_id, payload)
    .await
    .context("node execution failed")?;

  println!("{}", serde_json::to_string_pretty(&result)?);
  if !result.success {
    std::process::exit(1);
  }
  Ok(())
}

async fn load_workflow(path: &Path) -> Result<Workflow> {
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read workflow file: {}", path.display()))?;
  let def: WorkflowDef = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse workflow file: {}", path.display()))?;
  Ok(Workflow::new(def))
}

async fn load_catalog(path: Option<&Path>) -> Result<StaticCatalog> {
  let Some(path) = path else {
    return Ok(StaticCatalog::new());
  };
  let content = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
  StaticCatalog::from_json(&content)
    .with_context(|| format!("failed to parse catalog file: {}", path.display()))
}

/// Open the execution store. Recording is best effort, so failures are
/// logged and the run goes ahead without one.
async fn open_store(config: &Config) -> Option<Arc<dyn ExecutionStore>> {
  if config.no_record {
    return None;
  }
  if let Err(e) = tokio::fs::create_dir_all(&config.data_dir).await {
    warn!(error = %e, data_dir = %config.data_dir.display(), "data_dir_unavailable");
    return None;
  }

  let store = match SqliteStore::connect(&config.database_url).await {
    Ok(store) => store,
    Err(e) => {
      warn!(error = %e, "execution_store_unavailable");
      return None;
    }
  };
  if let Err(e) = store.migrate().await {
    warn!(error = %e, "execution_store_migration_failed");
    return None;
  }
  Some(Arc::new(store))
}

fn read_payload_from_stdin() -> Result<Value> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    return Ok(Value::Null);
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read payload from stdin")?;

  if input.trim().is_empty() {
    Ok(Value::Null)
  } else {
    serde_json::from_str(&input).context("failed to parse payload JSON from stdin")
  }
}
