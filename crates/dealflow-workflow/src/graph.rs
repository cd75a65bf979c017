use std::collections::HashMap;

use dealflow_config::{EdgeDef, NodeDef, NodeKind};

/// Graph structure for traversal.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  /// node_id -> outgoing edges, in definition order.
  outgoing: HashMap<String, Vec<EdgeDef>>,
  /// node_id -> upstream node_ids, in definition order.
  upstream: HashMap<String, Vec<String>>,
  /// Trigger nodes with no incoming edges, in definition order.
  entry_points: Vec<String>,
}

impl Graph {
  /// Build a graph from nodes and edges.
  ///
  /// Edges pointing at unknown nodes are kept; traversal just finds nothing
  /// behind them.
  pub fn new(nodes: &[NodeDef], edges: &[EdgeDef]) -> Self {
    let mut outgoing: HashMap<String, Vec<EdgeDef>> = HashMap::new();
    let mut upstream: HashMap<String, Vec<String>> = HashMap::new();

    for edge in edges {
      outgoing
        .entry(edge.source.clone())
        .or_default()
        .push(edge.clone());
      upstream
        .entry(edge.target.clone())
        .or_default()
        .push(edge.source.clone());
    }

    let entry_points = nodes
      .iter()
      .filter(|node| node.kind == NodeKind::Trigger)
      .filter(|node| upstream.get(&node.id).is_none_or(|v| v.is_empty()))
      .map(|node| node.id.clone())
      .collect();

    Self {
      outgoing,
      upstream,
      entry_points,
    }
  }

  /// Trigger nodes with no incoming edges.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Outgoing edges of a node.
  pub fn outgoing(&self, node_id: &str) -> &[EdgeDef] {
    self
      .outgoing
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Source node ids of a node's incoming edges.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .upstream
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Map;

  fn nodes() -> Vec<NodeDef> {
    vec![
      NodeDef::trigger("t1", "Manual", Map::new()),
      NodeDef::trigger("t2", "Webhook", Map::new()),
      NodeDef::action("a", "A", Map::new()),
      NodeDef::action("b", "B", Map::new()),
    ]
  }

  #[test]
  fn test_entry_points_are_triggers_without_incoming() {
    let edges = vec![
      EdgeDef::new("e1", "t1", "a"),
      EdgeDef::new("e2", "a", "t2"),
      EdgeDef::new("e3", "a", "b"),
    ];
    let graph = Graph::new(&nodes(), &edges);

    // t2 is a trigger but has an incoming edge
    assert_eq!(graph.entry_points(), &["t1".to_string()]);
  }

  #[test]
  fn test_outgoing_preserves_order_and_handles() {
    let edges = vec![
      EdgeDef::new("e1", "a", "b").with_handle("false"),
      EdgeDef::new("e2", "a", "t1").with_handle("true"),
    ];
    let graph = Graph::new(&nodes(), &edges);

    let out = graph.outgoing("a");
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].source_handle.as_deref(), Some("false"));
    assert_eq!(out[1].target, "t1");
    assert!(graph.outgoing("b").is_empty());
  }

  #[test]
  fn test_upstream() {
    let edges = vec![EdgeDef::new("e1", "t1", "b"), EdgeDef::new("e2", "a", "b")];
    let graph = Graph::new(&nodes(), &edges);

    assert_eq!(graph.upstream("b"), &["t1".to_string(), "a".to_string()]);
    assert!(graph.upstream("t1").is_empty());
  }
}
