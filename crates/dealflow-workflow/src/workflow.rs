use std::collections::{HashMap, HashSet};

use dealflow_config::{NodeDef, WorkflowDef};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::sanitize::sanitize_id;

/// A workflow indexed for execution.
#[derive(Debug, Clone)]
pub struct Workflow {
  def: WorkflowDef,
  /// raw node id -> position in `def.nodes`. First occurrence wins.
  by_id: HashMap<String, usize>,
  /// sanitized node id -> position in `def.nodes`.
  by_sanitized_id: HashMap<String, usize>,
  graph: Graph,
}

impl Workflow {
  pub fn new(def: WorkflowDef) -> Self {
    let mut by_id = HashMap::new();
    let mut by_sanitized_id = HashMap::new();
    for (idx, node) in def.nodes.iter().enumerate() {
      by_id.entry(node.id.clone()).or_insert(idx);
      by_sanitized_id.entry(sanitize_id(&node.id)).or_insert(idx);
    }
    let graph = Graph::new(&def.nodes, &def.edges);

    Self {
      def,
      by_id,
      by_sanitized_id,
      graph,
    }
  }

  pub fn id(&self) -> &str {
    self.def.id.as_deref().unwrap_or("")
  }

  pub fn name(&self) -> &str {
    self.def.name.as_deref().unwrap_or("")
  }

  pub fn nodes(&self) -> &[NodeDef] {
    &self.def.nodes
  }

  pub fn definition(&self) -> &WorkflowDef {
    &self.def
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Get a node by its raw ID.
  pub fn get_node(&self, node_id: &str) -> Option<&NodeDef> {
    self.by_id.get(node_id).map(|idx| &self.def.nodes[*idx])
  }

  /// Get a node by its sanitized ID (the key used in run outputs).
  pub fn get_node_by_sanitized_id(&self, sanitized_id: &str) -> Option<&NodeDef> {
    self
      .by_sanitized_id
      .get(sanitized_id)
      .map(|idx| &self.def.nodes[*idx])
  }

  /// Report duplicate node ids and edges that reference unknown nodes.
  ///
  /// Execution does not require this to pass.
  pub fn validate(&self) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for node in &self.def.nodes {
      if !seen.insert(node.id.as_str()) {
        return Err(WorkflowError::DuplicateNode(node.id.clone()));
      }
    }

    for edge in &self.def.edges {
      if !self.by_id.contains_key(&edge.source) || !self.by_id.contains_key(&edge.target) {
        return Err(WorkflowError::InvalidEdge {
          edge_id: edge.id.clone(),
          source_id: edge.source.clone(),
          target_id: edge.target.clone(),
        });
      }
    }

    Ok(())
  }
}

impl From<WorkflowDef> for Workflow {
  fn from(def: WorkflowDef) -> Self {
    Self::new(def)
  }
}
