use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key on the first normalized item that carries run metadata.
const META_KEY: &str = "_meta";

/// A single record flowing between data-aware steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowItem {
  pub json: Map<String, Value>,
}

impl WorkflowItem {
  pub fn new(json: Map<String, Value>) -> Self {
    Self { json }
  }

  /// An item with an empty `json` map.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Wrap a primitive as `{ value: primitive }`.
  pub fn from_primitive(value: Value) -> Self {
    let mut json = Map::new();
    json.insert("value".to_string(), value);
    Self { json }
  }

  /// Convert one array element into an item.
  ///
  /// `{json: {...}}` passes through, bare objects are wrapped and anything
  /// else becomes `{value: element}`.
  pub fn from_element(element: Value) -> Self {
    match element {
      Value::Object(mut obj) => {
        if matches!(obj.get("json"), Some(Value::Object(_))) {
          match obj.remove("json") {
            Some(Value::Object(json)) => Self { json },
            _ => Self::empty(),
          }
        } else {
          Self { json: obj }
        }
      }
      other => Self::from_primitive(other),
    }
  }

  /// The item as `{ "json": {...} }`.
  pub fn to_value(&self) -> Value {
    let mut obj = Map::new();
    obj.insert("json".to_string(), Value::Object(self.json.clone()));
    Value::Object(obj)
  }

  pub fn get(&self, path: &str) -> Option<&Value> {
    get_field_value(self, path)
  }
}

/// Normalize an arbitrary step output into a non-empty item list.
///
/// Objects shaped `{items: [...], ...rest}` are unpacked and `rest` is merged
/// into `_meta` of the first item only.
pub fn normalize_to_items(data: &Value) -> Vec<WorkflowItem> {
  match data {
    Value::Null => vec![WorkflowItem::empty()],
    Value::Array(elements) => {
      if elements.is_empty() {
        return vec![WorkflowItem::empty()];
      }
      elements.iter().cloned().map(WorkflowItem::from_element).collect()
    }
    Value::Object(obj) => {
      if let Some(items @ Value::Array(_)) = obj.get("items") {
        let mut normalized = normalize_to_items(items);
        let meta: Map<String, Value> = obj
          .iter()
          .filter(|(k, _)| k.as_str() != "items")
          .map(|(k, v)| (k.clone(), v.clone()))
          .collect();
        if !meta.is_empty() {
          merge_meta(&mut normalized[0], meta);
        }
        normalized
      } else {
        // `{success, data}` envelopes land here too and stay wrapped.
        vec![WorkflowItem::new(obj.clone())]
      }
    }
    primitive => vec![WorkflowItem::from_primitive(primitive.clone())],
  }
}

fn merge_meta(item: &mut WorkflowItem, meta: Map<String, Value>) {
  match item.json.get_mut(META_KEY) {
    Some(Value::Object(existing)) => existing.extend(meta),
    _ => {
      item.json.insert(META_KEY.to_string(), Value::Object(meta));
    }
  }
}

/// Walk `item.json` along a dot-separated path.
///
/// Returns `None` as soon as a segment is missing or the current value is not
/// an object.
pub fn get_field_value<'a>(item: &'a WorkflowItem, path: &str) -> Option<&'a Value> {
  let mut segments = path.split('.');
  let first = segments.next()?;
  let mut current = item.json.get(first)?;
  for segment in segments {
    current = current.as_object()?.get(segment)?;
  }
  Some(current)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_null_and_empty_array_normalize_to_one_empty_item() {
    assert_eq!(normalize_to_items(&Value::Null), vec![WorkflowItem::empty()]);
    assert_eq!(normalize_to_items(&json!([])), vec![WorkflowItem::empty()]);
  }

  #[test]
  fn test_array_elements() {
    let items = normalize_to_items(&json!([
      { "json": { "id": 1 } },
      { "id": 2 },
      "three",
      4
    ]));

    assert_eq!(items.len(), 4);
    assert_eq!(items[0].json["id"], 1);
    assert_eq!(items[1].json["id"], 2);
    assert_eq!(items[2].json["value"], "three");
    assert_eq!(items[3].json["value"], 4);
  }

  #[test]
  fn test_items_field_meta_goes_to_first_item_only() {
    let items = normalize_to_items(&json!({
      "items": [{ "json": { "a": 1 } }, { "json": { "a": 2 } }],
      "count": 2,
      "removedCount": 3
    }));

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].json["_meta"], json!({ "count": 2, "removedCount": 3 }));
    assert!(items[1].json.get("_meta").is_none());
  }

  #[test]
  fn test_items_field_without_siblings_has_no_meta() {
    let items = normalize_to_items(&json!({ "items": [{ "a": 1 }] }));
    assert_eq!(items, vec![WorkflowItem::new(json!({ "a": 1 }).as_object().unwrap().clone())]);
  }

  #[test]
  fn test_empty_items_field_still_yields_one_item_with_meta() {
    let items = normalize_to_items(&json!({ "items": [], "count": 0 }));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].json["_meta"]["count"], 0);
  }

  #[test]
  fn test_envelope_is_not_unwrapped() {
    let items = normalize_to_items(&json!({ "success": true, "data": { "id": 7 } }));
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].json["success"], true);
    assert_eq!(items[0].json["data"]["id"], 7);
  }

  #[test]
  fn test_primitive() {
    let items = normalize_to_items(&json!(42));
    assert_eq!(items[0].json["value"], 42);
  }

  #[test]
  fn test_get_field_value() {
    let items = normalize_to_items(&json!({ "a": { "b": 5 }, "s": "x" }));
    let item = &items[0];

    assert_eq!(get_field_value(item, "a.b"), Some(&json!(5)));
    assert_eq!(get_field_value(item, "a.c"), None);
    assert_eq!(get_field_value(item, "s.length"), None);
    assert_eq!(get_field_value(item, "missing.deep"), None);
  }

  #[test]
  fn test_item_serializes_with_json_key() {
    let item = WorkflowItem::from_primitive(json!(1));
    assert_eq!(serde_json::to_value(&item).unwrap(), json!({ "json": { "value": 1 } }));
    assert_eq!(item.to_value(), json!({ "json": { "value": 1 } }));
  }
}
