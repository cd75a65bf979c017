use serde::{Deserialize, Serialize};

use crate::edge::EdgeDef;
use crate::node::NodeDef;

/// A workflow as saved by the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::NodeKind;

  #[test]
  fn test_parse_workflow_def() {
    let def: WorkflowDef = serde_json::from_str(
      r#"{
        "name": "Deal intake",
        "nodes": [
          { "id": "t1", "type": "trigger", "data": { "label": "Manual", "config": { "triggerType": "Manual" } } },
          { "id": "a1", "type": "action", "data": { "label": "Limit", "config": { "actionType": "Limit", "maxItems": "2" } } }
        ],
        "edges": [ { "id": "e1", "source": "t1", "target": "a1" } ]
      }"#,
    )
    .unwrap();

    assert_eq!(def.name.as_deref(), Some("Deal intake"));
    assert_eq!(def.nodes.len(), 2);
    assert_eq!(def.nodes[0].kind, NodeKind::Trigger);
    assert_eq!(def.nodes[0].trigger_type(), Some("Manual"));
    assert_eq!(def.edges[0].target, "a1");
  }
}
