use dealflow_items::value::parse_int;
use serde_json::{Value, json};

use super::{LIMIT, items_value};
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Keeps at most `maxItems` items from the beginning or the end.
#[derive(Debug, Clone, Copy, Default)]
pub struct Limit;

impl ItemStep for Limit {
  fn label(&self) -> &'static str {
    LIMIT
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let items = input.items();
    let original_count = items.len();
    let max_items = input
      .get("maxItems")
      .and_then(parse_int)
      .map_or(1, |n| n.max(0) as usize)
      .min(original_count);

    let kept = if input.string("from").as_deref() == Some("end") {
      &items[original_count - max_items..]
    } else {
      &items[..max_items]
    };

    Ok(json!({
      "items": items_value(kept),
      "count": kept.len(),
      "originalCount": original_count,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::test_support::{input, item_json};

  fn five() -> Value {
    json!([{ "n": 1 }, { "n": 2 }, { "n": 3 }, { "n": 4 }, { "n": 5 }])
  }

  #[test]
  fn test_from_end() {
    let output = Limit
      .process(&input(json!({ "maxItems": "2", "from": "end" }), five()))
      .unwrap();

    assert_eq!(output["count"], 2);
    assert_eq!(output["originalCount"], 5);
    assert_eq!(item_json(&output), vec![json!({ "n": 4 }), json!({ "n": 5 })]);
  }

  #[test]
  fn test_from_beginning() {
    let output = Limit
      .process(&input(json!({ "maxItems": 3 }), five()))
      .unwrap();
    assert_eq!(item_json(&output)[2], json!({ "n": 3 }));
  }

  #[test]
  fn test_unparseable_defaults_to_one() {
    let output = Limit
      .process(&input(json!({ "maxItems": "lots" }), five()))
      .unwrap();
    assert_eq!(item_json(&output), vec![json!({ "n": 1 })]);
  }

  #[test]
  fn test_negative_and_oversized() {
    let none = Limit
      .process(&input(json!({ "maxItems": "-3" }), five()))
      .unwrap();
    assert_eq!(none["count"], 0);

    let all = Limit
      .process(&input(json!({ "maxItems": 50, "from": "end" }), five()))
      .unwrap();
    assert_eq!(all["count"], 5);
  }
}
