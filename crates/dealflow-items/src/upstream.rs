use serde_json::{Map, Value};

use crate::item::{WorkflowItem, normalize_to_items};

/// Input key for items already normalized per source node.
pub const NODE_ITEMS_KEY: &str = "_nodeItems";

/// Input key for raw upstream outputs (legacy form).
pub const NODE_OUTPUTS_KEY: &str = "_nodeOutputs";

/// Upstream data handed to a data-aware step.
///
/// `node_items` is preferred; `node_outputs` is the older raw form and is
/// unpacked on the fly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamData {
  /// Items keyed by source node, in upstream order.
  pub node_items: Option<Vec<(String, Vec<WorkflowItem>)>>,
  /// Raw outputs keyed by source node.
  pub node_outputs: Option<Map<String, Value>>,
}

impl UpstreamData {
  /// Build from already-recorded node outputs, normalizing each one.
  pub fn from_outputs<'a>(outputs: impl IntoIterator<Item = (&'a str, &'a Value)>) -> Self {
    let node_items = outputs
      .into_iter()
      .map(|(node_id, data)| (node_id.to_string(), normalize_to_items(data)))
      .collect();
    Self {
      node_items: Some(node_items),
      node_outputs: None,
    }
  }

  /// Read `_nodeItems` / `_nodeOutputs` from a JSON step input object.
  pub fn from_input(input: &Map<String, Value>) -> Self {
    let node_items = input
      .get(NODE_ITEMS_KEY)
      .and_then(Value::as_object)
      .map(|map| {
        map
          .iter()
          .map(|(node_id, items)| {
            let items = match items {
              Value::Array(elements) => elements
                .iter()
                .cloned()
                .map(WorkflowItem::from_element)
                .collect(),
              _ => Vec::new(),
            };
            (node_id.clone(), items)
          })
          .collect()
      });
    let node_outputs = input
      .get(NODE_OUTPUTS_KEY)
      .and_then(Value::as_object)
      .cloned();

    Self {
      node_items,
      node_outputs,
    }
  }

  /// The `_nodeItems` map in JSON form.
  pub fn node_items_value(&self) -> Option<Value> {
    self.node_items.as_ref().map(|branches| {
      Value::Object(
        branches
          .iter()
          .map(|(node_id, items)| {
            (
              node_id.clone(),
              Value::Array(items.iter().map(WorkflowItem::to_value).collect()),
            )
          })
          .collect(),
      )
    })
  }

  fn preferred_items(&self) -> Option<&Vec<(String, Vec<WorkflowItem>)>> {
    self.node_items.as_ref().filter(|branches| !branches.is_empty())
  }
}

/// All upstream items as one flat, non-empty list.
pub fn get_input_items(upstream: &UpstreamData) -> Vec<WorkflowItem> {
  let items: Vec<WorkflowItem> = match upstream.preferred_items() {
    Some(branches) => branches
      .iter()
      .flat_map(|(_, items)| items.iter().cloned())
      .collect(),
    None => upstream
      .node_outputs
      .iter()
      .flat_map(|outputs| outputs.values())
      .flat_map(unwrap_legacy_output)
      .collect(),
  };

  if items.is_empty() {
    vec![WorkflowItem::empty()]
  } else {
    items
  }
}

/// Upstream items kept apart per source node.
pub fn get_input_branches(upstream: &UpstreamData) -> Vec<(String, Vec<WorkflowItem>)> {
  match upstream.preferred_items() {
    Some(branches) => branches.clone(),
    None => upstream
      .node_outputs
      .iter()
      .flat_map(|outputs| outputs.iter())
      .map(|(node_id, data)| (node_id.clone(), unwrap_legacy_output(data)))
      .collect(),
  }
}

/// Turn one raw output into items: arrays flatten, `{success, data}`
/// envelopes unwrap to `data`, objects wrap, null contributes nothing.
fn unwrap_legacy_output(data: &Value) -> Vec<WorkflowItem> {
  match data {
    Value::Null => Vec::new(),
    Value::Array(elements) => elements
      .iter()
      .cloned()
      .map(WorkflowItem::from_element)
      .collect(),
    Value::Object(obj) if obj.contains_key("success") && obj.contains_key("data") => {
      unwrap_legacy_output(&obj["data"])
    }
    Value::Object(obj) => vec![WorkflowItem::new(obj.clone())],
    primitive => vec![WorkflowItem::from_primitive(primitive.clone())],
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn legacy(outputs: Value) -> UpstreamData {
    UpstreamData {
      node_items: None,
      node_outputs: outputs.as_object().cloned(),
    }
  }

  #[test]
  fn test_prefers_node_items() {
    let upstream = UpstreamData {
      node_items: Some(vec![
        ("a".to_string(), vec![WorkflowItem::from_primitive(json!(1))]),
        ("b".to_string(), vec![WorkflowItem::from_primitive(json!(2))]),
      ]),
      node_outputs: legacy(json!({ "c": [1, 2, 3] })).node_outputs,
    };

    let items = get_input_items(&upstream);
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].json["value"], 2);
  }

  #[test]
  fn test_legacy_unwraps_envelope_and_flattens() {
    let upstream = legacy(json!({
      "rows": { "success": true, "data": [{ "id": 1 }, { "id": 2 }] },
      "single": { "id": 3 },
      "skipped": null
    }));

    let items = get_input_items(&upstream);
    let ids: Vec<_> = items.iter().map(|i| i.json["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
  }

  #[test]
  fn test_never_empty() {
    assert_eq!(get_input_items(&UpstreamData::default()), vec![WorkflowItem::empty()]);
    assert_eq!(get_input_items(&legacy(json!({ "a": null }))), vec![WorkflowItem::empty()]);

    let empty_branches = UpstreamData {
      node_items: Some(vec![("a".to_string(), vec![])]),
      node_outputs: None,
    };
    assert_eq!(get_input_items(&empty_branches), vec![WorkflowItem::empty()]);
  }

  #[test]
  fn test_branches_stay_separate() {
    let upstream = legacy(json!({
      "left": [{ "x": 1 }, { "x": 2 }],
      "right": { "success": true, "data": { "x": 3 } }
    }));

    let branches = get_input_branches(&upstream);
    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].0, "left");
    assert_eq!(branches[0].1.len(), 2);
    assert_eq!(branches[1].1[0].json["x"], 3);
  }

  #[test]
  fn test_from_input_round_trips_node_items() {
    let upstream = UpstreamData::from_outputs([("a", &json!([{ "k": 1 }]))]);
    let mut input = Map::new();
    input.insert(NODE_ITEMS_KEY.to_string(), upstream.node_items_value().unwrap());

    let parsed = UpstreamData::from_input(&input);
    assert_eq!(parsed.node_items, upstream.node_items);
    assert!(parsed.node_outputs.is_none());
  }
}
