//! Execution result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Output recorded for one node during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeOutput {
  /// The node's label as stored in the workflow.
  pub label: String,
  /// `null` for disabled nodes.
  pub data: Value,
}

/// Run outputs keyed by sanitized node id.
pub type NodeOutputs = BTreeMap<String, NodeOutput>;

/// Result of a single node execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
  /// Node ID that was executed.
  pub node_id: String,
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl NodeResult {
  pub fn success(node_id: impl Into<String>, data: Value) -> Self {
    Self {
      node_id: node_id.into(),
      success: true,
      data: Some(data),
      error: None,
    }
  }

  pub fn failure(node_id: impl Into<String>, error: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      success: false,
      data: None,
      error: Some(error.into()),
    }
  }
}

/// Result of a complete workflow invocation.
///
/// `results` is the primary record. `data` and `error` are conveniences
/// taken from the last successful and first failed result in completion
/// order; they do not name a designated output node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
  /// Unique execution ID.
  pub execution_id: String,
  /// `true` when every executed node succeeded.
  pub success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub data: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  /// Per-node results, in completion order. Disabled nodes have none.
  pub results: Vec<NodeResult>,
  pub outputs: NodeOutputs,
}

impl WorkflowResult {
  pub fn new(execution_id: impl Into<String>, results: Vec<NodeResult>, outputs: NodeOutputs) -> Self {
    let success = results.iter().all(|r| r.success);
    let data = results
      .iter()
      .rev()
      .find(|r| r.success)
      .and_then(|r| r.data.clone());
    let error = results
      .iter()
      .find(|r| !r.success)
      .and_then(|r| r.error.clone());

    Self {
      execution_id: execution_id.into(),
      success,
      data,
      error,
      results,
      outputs,
    }
  }

  /// The result recorded for a node, if it ran.
  pub fn result(&self, node_id: &str) -> Option<&NodeResult> {
    self.results.iter().find(|r| r.node_id == node_id)
  }
}
