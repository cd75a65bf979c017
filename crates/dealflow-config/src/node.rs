use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ACTION_TYPE_KEY, TRIGGER_TYPE_KEY};

/// Top-level node kind as stored by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  /// Seeds a run with initial data.
  Trigger,
  /// Invokes a registered step.
  Action,
  /// Any kind this engine does not know how to execute (e.g. editor placeholders).
  #[serde(other)]
  Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: NodeKind,
  #[serde(default)]
  pub data: NodeData,
}

/// Editor-owned node payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  /// User-configured fields. String values may contain `{{@id:Label.path}}` templates.
  #[serde(default)]
  pub config: Map<String, Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enabled: Option<bool>,
}

impl NodeDef {
  pub fn trigger(id: impl Into<String>, label: impl Into<String>, config: Map<String, Value>) -> Self {
    Self {
      id: id.into(),
      kind: NodeKind::Trigger,
      data: NodeData {
        label: Some(label.into()),
        kind: Some("trigger".to_string()),
        config,
        ..NodeData::default()
      },
    }
  }

  pub fn action(id: impl Into<String>, label: impl Into<String>, config: Map<String, Value>) -> Self {
    Self {
      id: id.into(),
      kind: NodeKind::Action,
      data: NodeData {
        label: Some(label.into()),
        kind: Some("action".to_string()),
        config,
        ..NodeData::default()
      },
    }
  }

  /// Mark the node as a pass-through.
  pub fn disabled(mut self) -> Self {
    self.data.enabled = Some(false);
    self
  }

  /// Only an explicit `enabled: false` disables a node.
  pub fn is_enabled(&self) -> bool {
    self.data.enabled != Some(false)
  }

  pub fn label(&self) -> &str {
    self.data.label.as_deref().unwrap_or("")
  }

  /// The configured `actionType`, if it is a non-empty string.
  pub fn action_type(&self) -> Option<&str> {
    self.config_str(ACTION_TYPE_KEY)
  }

  /// The configured `triggerType`, if it is a non-empty string.
  pub fn trigger_type(&self) -> Option<&str> {
    self.config_str(TRIGGER_TYPE_KEY)
  }

  fn config_str(&self, key: &str) -> Option<&str> {
    self
      .data
      .config
      .get(key)
      .and_then(Value::as_str)
      .filter(|s| !s.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_parse_action_node() {
    let node: NodeDef = serde_json::from_value(json!({
      "id": "n-1",
      "type": "action",
      "data": {
        "label": "Get Row",
        "type": "action",
        "config": { "actionType": "supabase/get-row", "table": "deals" },
        "enabled": true
      }
    }))
    .unwrap();

    assert_eq!(node.kind, NodeKind::Action);
    assert_eq!(node.label(), "Get Row");
    assert_eq!(node.action_type(), Some("supabase/get-row"));
    assert!(node.is_enabled());
  }

  #[test]
  fn test_unknown_kind_is_unsupported() {
    let node: NodeDef = serde_json::from_value(json!({
      "id": "add",
      "type": "add",
      "data": {}
    }))
    .unwrap();

    assert_eq!(node.kind, NodeKind::Unsupported);
  }

  #[test]
  fn test_enabled_defaults_to_true() {
    let node: NodeDef =
      serde_json::from_value(json!({ "id": "t", "type": "trigger" })).unwrap();
    assert!(node.is_enabled());
    assert!(!node.disabled().is_enabled());
  }

  #[test]
  fn test_empty_action_type_is_none() {
    let mut config = Map::new();
    config.insert("actionType".to_string(), json!(""));
    let node = NodeDef::action("a", "A", config);
    assert_eq!(node.action_type(), None);
  }
}
