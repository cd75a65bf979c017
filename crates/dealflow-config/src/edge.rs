use serde::{Deserialize, Serialize};

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
  #[serde(default)]
  pub id: String,
  pub source: String,
  pub target: String,
  /// Which logical output of the source this edge leaves from
  /// (`"true"`/`"false"` for conditions, a case label or `"default"` for switches).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub source_handle: Option<String>,
}

impl EdgeDef {
  pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      source: source.into(),
      target: target.into(),
      source_handle: None,
    }
  }

  pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
    self.source_handle = Some(handle.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_edge_source_handle_wire_name() {
    let edge: EdgeDef = serde_json::from_value(serde_json::json!({
      "id": "e1",
      "source": "cond",
      "target": "approve",
      "sourceHandle": "true"
    }))
    .unwrap();

    assert_eq!(edge.source_handle.as_deref(), Some("true"));
  }

  #[test]
  fn test_edge_without_handle() {
    let edge: EdgeDef =
      serde_json::from_value(serde_json::json!({ "source": "a", "target": "b" })).unwrap();

    assert_eq!(edge.id, "");
    assert!(edge.source_handle.is_none());
  }
}
