use dealflow_items::{WorkflowItem, get_field_value};
use serde_json::{Value, json};

use super::{SPLIT_OUT, items_value};
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Explodes an array field into one item per element.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitOut;

impl ItemStep for SplitOut {
  fn label(&self) -> &'static str {
    SPLIT_OUT
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let field_path = input
      .non_empty("fieldPath")
      .ok_or_else(|| StepError::invalid_input("fieldPath", "a field path to split is required"))?;
    let include_other_fields = input.flag_enabled("includeOtherFields");

    let items = input.items();
    let original_count = items.len();
    let mut split = Vec::new();
    for item in items {
      split.extend(split_item(item, &field_path, include_other_fields));
    }

    Ok(json!({
      "items": items_value(&split),
      "count": split.len(),
      "originalCount": original_count,
    }))
  }
}

fn split_item(item: WorkflowItem, field_path: &str, include_other_fields: bool) -> Vec<WorkflowItem> {
  let Some(Value::Array(elements)) = get_field_value(&item, field_path) else {
    return vec![item];
  };
  // Only the top-level segment is replaced when other fields are kept.
  let top = field_path.split('.').next().unwrap_or(field_path);

  elements
    .iter()
    .map(|element| {
      if include_other_fields {
        let mut json = item.json.clone();
        json.insert(top.to_string(), element.clone());
        WorkflowItem::new(json)
      } else {
        match element {
          Value::Object(obj) => WorkflowItem::new(obj.clone()),
          other => WorkflowItem::from_primitive(other.clone()),
        }
      }
    })
    .collect()
}
