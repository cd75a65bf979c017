use dealflow_items::value::{display_string, number_value, parse_float};
use dealflow_items::{WorkflowItem, get_field_value};
use serde_json::{Map, Value, json};

use super::{AGGREGATE, declared_failure};
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Reduces upstream items to a single statistic or group counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregate;

impl ItemStep for Aggregate {
  fn label(&self) -> &'static str {
    AGGREGATE
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let items = input.items();
    let operation = input.non_empty("operation").unwrap_or_else(|| "count".to_string());
    let field = input.non_empty("field");

    match operation.as_str() {
      "count" => {
        let mut output = json!({ "operation": "count" });
        if let Some(field) = field {
          output["field"] = Value::String(field);
        }
        output["result"] = json!(items.len());
        output["count"] = json!(items.len());
        Ok(output)
      }
      "groupBy" => {
        let Some(group_field) = input.non_empty("groupByField").or(field) else {
          return Ok(declared_failure("groupBy requires a field to group by"));
        };
        let groups = group_counts(&items, &group_field);
        let group_count = groups.len();
        Ok(json!({
          "operation": "groupBy",
          "field": group_field,
          "groups": groups,
          "groupCount": group_count,
          "count": items.len(),
        }))
      }
      "sum" | "average" | "min" | "max" => {
        let Some(field) = field else {
          return Ok(declared_failure(format!("{} requires a field", operation)));
        };
        let sample = numeric_sample(&items, &field);
        let result = reduce(&operation, &sample);
        Ok(json!({
          "operation": operation,
          "field": field,
          "result": number_value(result),
          "count": sample.len(),
        }))
      }
      other => Ok(declared_failure(format!("Unknown aggregate operation: {}", other))),
    }
  }
}

/// Field values that coerce to finite numbers.
fn numeric_sample(items: &[WorkflowItem], field: &str) -> Vec<f64> {
  items
    .iter()
    .filter_map(|item| get_field_value(item, field))
    .map(parse_float)
    .filter(|n| n.is_finite())
    .collect()
}

fn reduce(operation: &str, sample: &[f64]) -> f64 {
  if sample.is_empty() {
    return 0.0;
  }
  let sum: f64 = sample.iter().sum();
  match operation {
    "sum" => sum,
    "average" => sum / sample.len() as f64,
    "min" => sample.iter().copied().fold(f64::INFINITY, f64::min),
    "max" => sample.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    _ => 0.0,
  }
}

/// Item counts per distinct field value, in first-seen order. Missing values
/// group under `""`.
fn group_counts(items: &[WorkflowItem], field: &str) -> Map<String, Value> {
  let mut groups = Map::new();
  for item in items {
    let key = get_field_value(item, field)
      .map(display_string)
      .unwrap_or_default();
    let count = groups.get(&key).and_then(Value::as_u64).unwrap_or(0);
    groups.insert(key, json!(count + 1));
  }
  groups
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::test_support::input;

  fn aggregate(fields: Value, data: Value) -> Value {
    Aggregate.process(&input(fields, data)).unwrap()
  }

  #[test]
  fn test_sum_excludes_non_numeric() {
    let output = aggregate(
      json!({ "operation": "sum", "field": "n" }),
      json!([{ "n": "3" }, { "n": "x" }, { "n": 5 }]),
    );
    assert_eq!(output["result"], 8);
    assert_eq!(output["count"], 2);
    assert_eq!(output["field"], "n");
  }

  #[test]
  fn test_average_min_max() {
    let data = json!([{ "n": 1 }, { "n": 2 }, { "n": "4.5" }, { "m": 9 }]);
    assert_eq!(aggregate(json!({ "operation": "average", "field": "n" }), data.clone())["result"], 2.5);
    assert_eq!(aggregate(json!({ "operation": "min", "field": "n" }), data.clone())["result"], 1);
    assert_eq!(aggregate(json!({ "operation": "max", "field": "n" }), data)["result"], 4.5);
  }

  #[test]
  fn test_empty_sample() {
    let output = aggregate(json!({ "operation": "max", "field": "n" }), json!([{ "n": "none" }]));
    assert_eq!(output["result"], 0);
    assert_eq!(output["count"], 0);
  }

  #[test]
  fn test_count_ignores_field() {
    let output = aggregate(json!({ "operation": "count", "field": "zzz" }), json!([{}, {}, {}]));
    assert_eq!(output, json!({ "operation": "count", "field": "zzz", "result": 3, "count": 3 }));
  }

  #[test]
  fn test_group_by() {
    let output = aggregate(
      json!({ "operation": "groupBy", "field": "ignored", "groupByField": "stage" }),
      json!([{ "stage": "open" }, { "stage": "won" }, { "stage": "open" }, {}]),
    );
    assert_eq!(output["field"], "stage");
    assert_eq!(output["groups"], json!({ "open": 2, "won": 1, "": 1 }));
    assert_eq!(output["groupCount"], 3);
    assert_eq!(output["count"], 4);
  }

  #[test]
  fn test_declared_failures() {
    let no_group = aggregate(json!({ "operation": "groupBy" }), json!([{}]));
    assert_eq!(no_group["success"], false);
    assert!(no_group.get("groups").is_none());

    let no_field = aggregate(json!({ "operation": "sum" }), json!([{}]));
    assert_eq!(no_field["success"], false);

    let unknown = aggregate(json!({ "operation": "median", "field": "n" }), json!([{}]));
    assert_eq!(unknown["error"], "Unknown aggregate operation: median");
  }
}
