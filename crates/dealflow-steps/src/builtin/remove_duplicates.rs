use std::collections::HashSet;

use dealflow_items::value::display_string;
use dealflow_items::{WorkflowItem, get_field_value};
use serde_json::{Value, json};

use super::{REMOVE_DUPLICATES, items_value};
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Drops items whose `dedupField` value was already seen.
///
/// With `keep: "last"` the final occurrence of each key survives, and
/// survivors stay in their original relative order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveDuplicates;

impl ItemStep for RemoveDuplicates {
  fn label(&self) -> &'static str {
    REMOVE_DUPLICATES
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let items = input.items();
    let original_count = items.len();
    let field = input.string("dedupField").unwrap_or_default();

    let kept = if input.string("keep").as_deref() == Some("last") {
      let mut reversed = dedupe(items.into_iter().rev(), &field);
      reversed.reverse();
      reversed
    } else {
      dedupe(items.into_iter(), &field)
    };

    Ok(json!({
      "items": items_value(&kept),
      "count": kept.len(),
      "removedCount": original_count - kept.len(),
    }))
  }
}

fn dedupe(items: impl Iterator<Item = WorkflowItem>, field: &str) -> Vec<WorkflowItem> {
  let mut seen = HashSet::new();
  items
    .filter(|item| seen.insert(dedup_key(item, field)))
    .collect()
}

fn dedup_key(item: &WorkflowItem, field: &str) -> String {
  if field.is_empty() {
    return String::new();
  }
  get_field_value(item, field)
    .map(display_string)
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::test_support::{input, item_json};

  fn data() -> Value {
    json!([{ "k": 1, "v": "a" }, { "k": 1, "v": "b" }, { "k": 2, "v": "c" }])
  }

  #[test]
  fn test_keep_last() {
    let output = RemoveDuplicates
      .process(&input(json!({ "dedupField": "k", "keep": "last" }), data()))
      .unwrap();

    assert_eq!(
      item_json(&output),
      vec![json!({ "k": 1, "v": "b" }), json!({ "k": 2, "v": "c" })]
    );
    assert_eq!(output["removedCount"], 1);
  }

  #[test]
  fn test_keep_first() {
    let output = RemoveDuplicates
      .process(&input(json!({ "dedupField": "k" }), data()))
      .unwrap();

    assert_eq!(
      item_json(&output),
      vec![json!({ "k": 1, "v": "a" }), json!({ "k": 2, "v": "c" })]
    );
    assert_eq!(output["count"], 2);
  }

  #[test]
  fn test_string_keys_merge_number_and_text() {
    let output = RemoveDuplicates
      .process(&input(
        json!({ "dedupField": "k" }),
        json!([{ "k": 1 }, { "k": "1" }, { "x": 0 }, { "k": "" }]),
      ))
      .unwrap();

    // 1 and "1" share a key, as do a missing field and "".
    assert_eq!(item_json(&output), vec![json!({ "k": 1 }), json!({ "x": 0 })]);
  }

  #[test]
  fn test_unset_field_keeps_one_item() {
    let output = RemoveDuplicates.process(&input(json!({}), data())).unwrap();
    assert_eq!(output["count"], 1);
    assert_eq!(output["removedCount"], 2);
  }
}
