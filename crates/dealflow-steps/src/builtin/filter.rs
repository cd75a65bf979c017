use serde_json::{Value, json};

use super::{FILTER, items_value};
use crate::condition::ConditionGroup;
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Keeps the items a structured `condition` accepts.
///
/// An unparseable condition lets every item through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filter;

impl ItemStep for Filter {
  fn label(&self) -> &'static str {
    FILTER
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let items = input.items();
    let original_count = items.len();

    let (kept, rejected) = match input.get("condition").and_then(ConditionGroup::from_value) {
      // Rows compare their literal operands; the item itself is not consulted.
      Some(group) => items.into_iter().partition(|_| group.evaluate()),
      None => (items, Vec::new()),
    };

    Ok(json!({
      "items": items_value(&kept),
      "rejectedItems": items_value(&rejected),
      "count": kept.len(),
      "originalCount": original_count,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::test_support::{input, item_json};

  fn rows() -> Value {
    json!([{ "stage": "open" }, { "stage": "closed" }, { "stage": "open" }])
  }

  #[test]
  fn test_unparseable_condition_passes_everything() {
    let output = Filter
      .process(&input(json!({ "condition": "{not json" }), rows()))
      .unwrap();

    assert_eq!(output["count"], 3);
    assert_eq!(output["originalCount"], 3);
    assert_eq!(output["rejectedItems"], json!([]));
  }

  #[test]
  fn test_missing_condition_passes_everything() {
    let output = Filter.process(&input(json!({}), rows())).unwrap();
    assert_eq!(item_json(&output).len(), 3);
  }

  #[test]
  fn test_true_condition_keeps_all() {
    let condition = json!({
      "match": "and",
      "conditions": [
        { "leftValue": "500", "operator": "greater_than", "rightValue": "100", "dataType": "number" }
      ]
    })
    .to_string();

    let output = Filter
      .process(&input(json!({ "condition": condition }), rows()))
      .unwrap();
    assert_eq!(output["count"], 3);
    assert_eq!(output["rejectedItems"], json!([]));
  }

  #[test]
  fn test_false_condition_rejects_all() {
    let condition = json!({
      "match": "or",
      "conditions": [
        { "leftValue": "open", "operator": "equals", "rightValue": "closed", "dataType": "string" }
      ]
    })
    .to_string();

    let output = Filter
      .process(&input(json!({ "condition": condition }), rows()))
      .unwrap();
    assert_eq!(output["count"], 0);
    assert_eq!(output["items"], json!([]));
    assert_eq!(output["rejectedItems"].as_array().unwrap().len(), 3);
    assert_eq!(output["rejectedItems"][1]["json"]["stage"], "closed");
  }
}
