//! Workflow runtime.
//!
//! The [`Runtime`] owns a workflow and the collaborators a run needs (step
//! registry, plugin catalog, event notifier and an optional execution
//! store) and provides `invoke(trigger_input, cancel)` to walk the graph.
//!
//! A run starts at every trigger without incoming edges and recurses along
//! the edges each node's outcome selects. Branches run concurrently within
//! the invoking task; a shared visited set makes every node run at most
//! once.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;
use dealflow_config::{NodeDef, NodeKind};
use dealflow_items::UpstreamData;
use dealflow_steps::{
  ActionKind, PluginCatalog, ResolvedStep, StaticCatalog, StepContext, StepInput, StepRegistry,
  StepResult,
};
use dealflow_store::{ExecutionRecord, ExecutionStatus, ExecutionStore, Json};
use dealflow_workflow::{Workflow, sanitize_id};
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::error::RuntimeError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{NodeOutput, NodeOutputs, NodeResult, WorkflowResult};
use crate::routing::next_edges;
use crate::template::process_templates;
use crate::trigger::trigger_output;

/// The workflow runtime.
pub struct Runtime {
  workflow: Arc<Workflow>,
  registry: Arc<StepRegistry>,
  catalog: Arc<dyn PluginCatalog>,
  notifier: Arc<dyn ExecutionNotifier>,
  store: Option<Arc<dyn ExecutionStore>>,
}

impl Runtime {
  /// Create a runtime with an empty plugin catalog, no event consumer and
  /// no execution store.
  pub fn new(workflow: Workflow, registry: StepRegistry) -> Self {
    Self {
      workflow: Arc::new(workflow),
      registry: Arc::new(registry),
      catalog: Arc::new(StaticCatalog::new()),
      notifier: Arc::new(NoopNotifier),
      store: None,
    }
  }

  pub fn with_catalog(mut self, catalog: Arc<dyn PluginCatalog>) -> Self {
    self.catalog = catalog;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  /// Record each completed run. Writes are best effort.
  pub fn with_store(mut self, store: Arc<dyn ExecutionStore>) -> Self {
    self.store = Some(store);
    self
  }

  /// Get a reference to the workflow.
  pub fn workflow(&self) -> &Workflow {
    &self.workflow
  }

  /// Check for duplicate node ids and dangling edges.
  ///
  /// Runs do not call this; a dangling edge simply leads nowhere.
  pub fn validate(&self) -> Result<(), RuntimeError> {
    self
      .workflow
      .validate()
      .map_err(|e| RuntimeError::InvalidGraph {
        message: e.to_string(),
      })
  }

  /// Execute the workflow with a fresh execution id.
  pub async fn invoke(
    &self,
    trigger_input: Option<Map<String, Value>>,
    cancel: CancellationToken,
  ) -> Result<WorkflowResult, RuntimeError> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    self
      .invoke_with_id(execution_id, trigger_input, cancel)
      .await
  }

  /// Execute the workflow under a caller-supplied execution id.
  #[instrument(
    name = "runtime_invoke",
    skip(self, trigger_input, cancel),
    fields(workflow_id = %self.workflow.id())
  )]
  pub async fn invoke_with_id(
    &self,
    execution_id: String,
    trigger_input: Option<Map<String, Value>>,
    cancel: CancellationToken,
  ) -> Result<WorkflowResult, RuntimeError> {
    let started = Instant::now();
    info!(
      execution_id = %execution_id,
      workflow_id = %self.workflow.id(),
      entry_points = ?self.workflow.graph().entry_points(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow_id: self.workflow.id().to_string(),
    });

    if cancel.is_cancelled() {
      warn!(execution_id = %execution_id, "workflow cancelled");
      return Err(RuntimeError::Cancelled);
    }

    let run = Run::new(self, execution_id.clone(), trigger_input);
    let entry_points = self.workflow.graph().entry_points();

    tokio::select! {
      _ = join_all(entry_points.iter().map(|id| run.visit(id.clone()))) => {}
      _ = cancel.cancelled() => {
        warn!(execution_id = %execution_id, "workflow cancelled during execution");
        return Err(RuntimeError::Cancelled);
      }
    }

    let result = run.finish();
    let duration_ms = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);

    if result.success {
      info!(
        execution_id = %execution_id,
        nodes = result.results.len(),
        duration_ms,
        "workflow_completed"
      );
    } else {
      error!(
        execution_id = %execution_id,
        error = result.error.as_deref().unwrap_or_default(),
        duration_ms,
        "workflow_failed"
      );
    }
    self.notifier.notify(ExecutionEvent::WorkflowCompleted {
      execution_id: execution_id.clone(),
      success: result.success,
    });

    self.record_execution(&result, duration_ms).await;
    Ok(result)
  }

  /// Execute a single node in isolation.
  ///
  /// This is for debugging: `input` is a map of node id to output data and
  /// serves both as the template context and as the upstream data of
  /// data-aware steps. Trigger nodes treat `input` as the trigger input.
  #[instrument(
    name = "runtime_invoke_node",
    skip(self, input),
    fields(workflow_id = %self.workflow.id(), node_id = %node_id)
  )]
  pub async fn invoke_node(&self, node_id: &str, input: Value) -> Result<NodeResult, RuntimeError> {
    let node = self
      .workflow
      .get_node(node_id)
      .ok_or_else(|| RuntimeError::NodeNotFound(node_id.to_string()))?;
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(execution_id = %execution_id, node_id = %node_id, "invoke_node_started");

    let input = match input {
      Value::Object(map) => map,
      Value::Null => Map::new(),
      other => {
        return Err(RuntimeError::InvalidInput {
          message: format!("node input must be a JSON object, got {}", other),
        });
      }
    };

    let result = match node.kind {
      NodeKind::Trigger => {
        let data = trigger_output(node, Some(&input), Utc::now().timestamp_millis());
        NodeResult::success(&node.id, data)
      }
      NodeKind::Action => {
        let run = Run::new(self, execution_id, None);
        let upstream_ids: Vec<String> = input.keys().map(|k| sanitize_id(k)).collect();
        run.seed_outputs(input);
        let (outcome, _) = run.run_action(node, Some(upstream_ids)).await;
        node_result(&node.id, outcome)
      }
      NodeKind::Unsupported => {
        return Err(RuntimeError::UnsupportedNode {
          node_id: node.id.clone(),
        });
      }
    };

    if result.success {
      info!(node_id = %node_id, "invoke_node_completed");
    } else {
      error!(node_id = %node_id, error = ?result.error, "invoke_node_failed");
    }
    Ok(result)
  }

  /// Write the execution record, logging instead of failing.
  async fn record_execution(&self, result: &WorkflowResult, duration_ms: i64) {
    let Some(store) = &self.store else {
      return;
    };

    let output = serde_json::json!({
      "data": result.data,
      "results": result.results,
      "outputs": result.outputs,
    });
    let workflow_id = Some(self.workflow.id())
      .filter(|id| !id.is_empty())
      .map(str::to_string);
    let record = ExecutionRecord {
      execution_id: result.execution_id.clone(),
      workflow_id,
      status: ExecutionStatus::from_success(result.success),
      output: Some(Json(output)),
      error: result.error.clone(),
      completed_at: Utc::now(),
      duration_ms,
    };

    match store.complete_execution(&record).await {
      Ok(()) => debug!(execution_id = %record.execution_id, "execution_recorded"),
      Err(e) => warn!(
        execution_id = %record.execution_id,
        error = %e,
        "execution_record_failed"
      ),
    }
  }
}

/// Mutable state shared by all branches of one run.
#[derive(Default)]
struct RunState {
  visited: HashSet<String>,
  outputs: NodeOutputs,
  results: Vec<NodeResult>,
}

/// One invocation in progress.
struct Run<'r> {
  runtime: &'r Runtime,
  execution_id: String,
  trigger_input: Option<Map<String, Value>>,
  state: Mutex<RunState>,
}

impl<'r> Run<'r> {
  fn new(runtime: &'r Runtime, execution_id: String, trigger_input: Option<Map<String, Value>>) -> Self {
    Self {
      runtime,
      execution_id,
      trigger_input,
      state: Mutex::new(RunState::default()),
    }
  }

  fn state(&self) -> MutexGuard<'_, RunState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Check-and-mark under one lock. `false` if the node already ran.
  fn mark_visited(&self, node_id: &str) -> bool {
    self.state().visited.insert(node_id.to_string())
  }

  fn record_output(&self, node: &NodeDef, data: Value) {
    self.state().outputs.insert(
      sanitize_id(&node.id),
      NodeOutput {
        label: node.label().to_string(),
        data,
      },
    );
  }

  fn record_result(&self, result: NodeResult) {
    self.state().results.push(result);
  }

  fn seed_outputs(&self, outputs: Map<String, Value>) {
    let mut state = self.state();
    for (node_id, data) in outputs {
      let label = self
        .runtime
        .workflow
        .get_node(&node_id)
        .map(|n| n.label().to_string())
        .unwrap_or_else(|| node_id.clone());
      state
        .outputs
        .insert(sanitize_id(&node_id), NodeOutput { label, data });
    }
  }

  fn outputs_snapshot(&self) -> NodeOutputs {
    self.state().outputs.clone()
  }

  fn finish(self) -> WorkflowResult {
    let state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);
    WorkflowResult::new(self.execution_id, state.results, state.outputs)
  }

  /// Run a node (at most once) and then everything its outcome leads to.
  fn visit(&self, node_id: String) -> BoxFuture<'_, ()> {
    async move {
      if !self.mark_visited(&node_id) {
        return;
      }
      // Edges may name nodes that do not exist.
      let Some(node) = self.runtime.workflow.get_node(&node_id) else {
        debug!(node_id = %node_id, "edge_target_missing");
        return;
      };

      let next = match AssertUnwindSafe(self.execute_node(node)).catch_unwind().await {
        Ok(next) => next,
        Err(panic) => {
          let message = format!("node panicked: {}", panic_message(panic.as_ref()));
          self.fail(node, message);
          Vec::new()
        }
      };

      join_all(next.into_iter().map(|id| self.visit(id))).await;
    }
    .boxed()
  }

  /// Execute one node and return the ids of the nodes to visit next.
  async fn execute_node(&self, node: &NodeDef) -> Vec<String> {
    let graph = self.runtime.workflow.graph();
    let all_targets = || {
      graph
        .outgoing(&node.id)
        .iter()
        .map(|e| e.target.clone())
        .collect::<Vec<_>>()
    };

    if !node.is_enabled() {
      self.record_output(node, Value::Null);
      info!(execution_id = %self.execution_id, node_id = %node.id, "node_skipped");
      self.runtime.notifier.notify(ExecutionEvent::NodeSkipped {
        execution_id: self.execution_id.clone(),
        node_id: node.id.clone(),
      });
      return all_targets();
    }

    info!(
      execution_id = %self.execution_id,
      node_id = %node.id,
      label = %node.label(),
      "node_started"
    );
    self.runtime.notifier.notify(ExecutionEvent::NodeStarted {
      execution_id: self.execution_id.clone(),
      node_id: node.id.clone(),
    });

    match node.kind {
      NodeKind::Trigger => {
        let data = trigger_output(
          node,
          self.trigger_input.as_ref(),
          Utc::now().timestamp_millis(),
        );
        self.succeed(node, data);
        all_targets()
      }
      NodeKind::Action => {
        let (outcome, kind) = self.run_action(node, None).await;
        match outcome {
          StepResult::Success(data) => {
            let next = next_edges(kind, &data, graph.outgoing(&node.id))
              .into_iter()
              .map(|e| e.target.clone())
              .collect();
            self.succeed(node, data);
            next
          }
          StepResult::Failure(message) => {
            self.fail(node, message);
            Vec::new()
          }
        }
      }
      NodeKind::Unsupported => {
        let message = RuntimeError::UnsupportedNode {
          node_id: node.id.clone(),
        }
        .to_string();
        self.fail(node, message);
        Vec::new()
      }
    }
  }

  /// Resolve and invoke the step behind an action node, exactly once.
  ///
  /// `upstream_ids` overrides the sanitized ids data-aware steps read from;
  /// by default they are the node's direct upstream nodes in edge order.
  async fn run_action(
    &self,
    node: &NodeDef,
    upstream_ids: Option<Vec<String>>,
  ) -> (StepResult, ActionKind) {
    let Some(action_type) = node.action_type() else {
      let message = format!("Action node '{}' has no action type configured", node.label());
      return (StepResult::Failure(message), ActionKind::Step);
    };

    let Some(resolved) = self
      .runtime
      .registry
      .resolve(action_type, self.runtime.catalog.as_ref())
    else {
      let message = self.runtime.registry.unknown_action_message(action_type);
      return (StepResult::Failure(message), ActionKind::from_label(action_type));
    };
    let kind = ActionKind::from_label(&resolved.label);

    let outputs = self.outputs_snapshot();
    let fields = process_templates(&node.data.config, &outputs);
    let context = StepContext {
      execution_id: self.execution_id.clone(),
      node_id: node.id.clone(),
      node_name: node.label().to_string(),
      node_type: action_type.to_string(),
    };

    let mut upstream = UpstreamData::default();
    if resolved.step.data_aware() {
      let ids = upstream_ids.unwrap_or_else(|| {
        let graph = self.runtime.workflow.graph();
        graph.upstream(&node.id).iter().map(|id| sanitize_id(id)).collect()
      });
      upstream = UpstreamData::from_outputs(
        ids
          .iter()
          .filter_map(|id| outputs.get(id).map(|o| (id.as_str(), &o.data))),
      );
    }
    if kind == ActionKind::Code {
      upstream.node_outputs = Some(self.output_aliases(&outputs));
    }

    debug!(
      execution_id = %self.execution_id,
      node_id = %node.id,
      step = %resolved.label,
      "step_invoked"
    );
    let input = StepInput::new(fields, context).with_upstream(upstream);
    (resolved.step.run(input).await.into(), kind)
  }

  /// Every prior output under its stored label and the label its action
  /// type resolves to: the registry key for a direct match, else the
  /// catalog label.
  fn output_aliases(&self, outputs: &NodeOutputs) -> Map<String, Value> {
    let registry = &self.runtime.registry;
    let catalog = &self.runtime.catalog;
    let mut aliases = Map::new();

    for (sanitized_id, output) in outputs {
      let action_type = self
        .runtime
        .workflow
        .get_node_by_sanitized_id(sanitized_id)
        .and_then(NodeDef::action_type);
      let resolved = action_type.and_then(|t| registry.resolve(t, catalog.as_ref()));
      let (registry_label, catalog_label) = match resolved {
        Some(ResolvedStep {
          catalog_label: Some(catalog_label),
          ..
        }) => (None, Some(catalog_label)),
        Some(resolved) => (Some(resolved.label), None),
        None => (None, None),
      };

      let keys = [Some(output.label.clone()), registry_label, catalog_label];
      for key in keys.into_iter().flatten().filter(|k| !k.is_empty()) {
        aliases.insert(key, output.data.clone());
      }
    }
    aliases
  }

  fn succeed(&self, node: &NodeDef, data: Value) {
    info!(execution_id = %self.execution_id, node_id = %node.id, "node_completed");
    self.runtime.notifier.notify(ExecutionEvent::NodeCompleted {
      execution_id: self.execution_id.clone(),
      node_id: node.id.clone(),
      data: data.clone(),
    });
    self.record_output(node, data.clone());
    self.record_result(NodeResult::success(&node.id, data));
  }

  fn fail(&self, node: &NodeDef, message: String) {
    error!(
      execution_id = %self.execution_id,
      node_id = %node.id,
      error = %message,
      "node_failed"
    );
    self.runtime.notifier.notify(ExecutionEvent::NodeFailed {
      execution_id: self.execution_id.clone(),
      node_id: node.id.clone(),
      error: message.clone(),
    });
    self.record_result(NodeResult::failure(&node.id, message));
  }
}

fn node_result(node_id: &str, outcome: StepResult) -> NodeResult {
  match outcome {
    StepResult::Success(data) => NodeResult::success(node_id, data),
    StepResult::Failure(message) => NodeResult::failure(node_id, message),
  }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
  if let Some(s) = panic.downcast_ref::<&str>() {
    s
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s
  } else {
    "unknown panic"
  }
}
