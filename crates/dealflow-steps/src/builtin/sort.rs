use std::cmp::Ordering;

use dealflow_items::value::{display_string, locale_compare, parse_date, parse_float};
use dealflow_items::{WorkflowItem, get_field_value};
use serde_json::{Value, json};

use super::{SORT, items_value};
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Stable sort on one field.
///
/// Missing values always sort last, then values that do not parse under the
/// chosen type; direction only reorders the comparable values. `auto` sorts
/// numerically only when every present value is a JSON number, otherwise the
/// whole column compares as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sort;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortType {
  Auto,
  String,
  Number,
  Date,
}

impl SortType {
  fn parse(value: Option<&str>) -> Self {
    match value {
      Some("string") => Self::String,
      Some("number") => Self::Number,
      Some("date") => Self::Date,
      _ => Self::Auto,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
enum SortKey {
  Number(f64),
  Date(i64),
  Text(String),
  /// Present but not parseable as the sort type.
  Unparsed,
  Missing,
}

impl SortKey {
  fn rank(&self) -> u8 {
    match self {
      Self::Number(_) | Self::Date(_) | Self::Text(_) => 0,
      Self::Unparsed => 1,
      Self::Missing => 2,
    }
  }
}

impl ItemStep for Sort {
  fn label(&self) -> &'static str {
    SORT
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let items = input.items();
    let Some(field) = input.non_empty("sortField") else {
      return Ok(json!({ "items": items_value(&items), "count": items.len() }));
    };
    let descending = input.string("direction").as_deref() == Some("descending");
    let sort_type = SortType::parse(input.string("dataType").as_deref());

    let sorted = sort_items(items, &field, sort_type, descending);
    Ok(json!({ "items": items_value(&sorted), "count": sorted.len() }))
  }
}

fn sort_items(
  items: Vec<WorkflowItem>,
  field: &str,
  sort_type: SortType,
  descending: bool,
) -> Vec<WorkflowItem> {
  let values: Vec<Option<&Value>> = items
    .iter()
    .map(|item| get_field_value(item, field).filter(|v| !v.is_null()))
    .collect();

  // `auto` compares numerically only when every present value is a number.
  let sort_type = match sort_type {
    SortType::Auto if values.iter().flatten().all(|v| v.is_number()) => SortType::Number,
    SortType::Auto => SortType::String,
    other => other,
  };

  let keys: Vec<SortKey> = values
    .into_iter()
    .map(|value| sort_key(value, sort_type))
    .collect();

  let mut keyed: Vec<(SortKey, WorkflowItem)> = keys.into_iter().zip(items).collect();
  keyed.sort_by(|(a, _), (b, _)| compare_keys(a, b, descending));
  keyed.into_iter().map(|(_, item)| item).collect()
}

fn sort_key(value: Option<&Value>, sort_type: SortType) -> SortKey {
  let Some(value) = value else {
    return SortKey::Missing;
  };
  match sort_type {
    SortType::Number => {
      let n = parse_float(value);
      if n.is_nan() {
        SortKey::Unparsed
      } else {
        SortKey::Number(n)
      }
    }
    SortType::Date => parse_date(value).map_or(SortKey::Unparsed, SortKey::Date),
    SortType::String | SortType::Auto => SortKey::Text(display_string(value)),
  }
}

fn compare_keys(a: &SortKey, b: &SortKey, descending: bool) -> Ordering {
  let ordering = match (a, b) {
    (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
    (SortKey::Date(x), SortKey::Date(y)) => x.cmp(y),
    (SortKey::Text(x), SortKey::Text(y)) => locale_compare(x, y),
    _ => return a.rank().cmp(&b.rank()),
  };
  if descending {
    ordering.reverse()
  } else {
    ordering
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::test_support::{input, item_json};

  fn sorted(fields: Value, data: Value) -> Vec<Value> {
    item_json(&Sort.process(&input(fields, data)).unwrap())
  }

  #[test]
  fn test_missing_sorts_last_in_both_directions() {
    let data = json!([{ "f": 2 }, { "g": 0 }, { "f": 1 }]);

    let asc = sorted(json!({ "sortField": "f", "direction": "ascending" }), data.clone());
    assert_eq!(asc, vec![json!({ "f": 1 }), json!({ "f": 2 }), json!({ "g": 0 })]);

    let desc = sorted(json!({ "sortField": "f", "direction": "descending" }), data);
    assert_eq!(desc, vec![json!({ "f": 2 }), json!({ "f": 1 }), json!({ "g": 0 })]);
  }

  #[test]
  fn test_auto_with_mixed_values_compares_as_text() {
    let data = json!([{ "f": "b" }, { "f": 10 }, { "f": "A" }]);
    let result = sorted(json!({ "sortField": "f" }), data);
    assert_eq!(result, vec![json!({ "f": 10 }), json!({ "f": "A" }), json!({ "f": "b" })]);
  }

  #[test]
  fn test_auto_with_numeric_string_compares_as_text() {
    let data = json!([{ "f": "9" }, { "f": 10 }]);
    let result = sorted(json!({ "sortField": "f" }), data);
    assert_eq!(result, vec![json!({ "f": 10 }), json!({ "f": "9" })]);
  }

  #[test]
  fn test_number_type_puts_unparsed_before_missing() {
    let data = json!([{ "f": "x" }, {}, { "f": "10" }, { "f": "9" }]);
    let result = sorted(
      json!({ "sortField": "f", "dataType": "number", "direction": "descending" }),
      data,
    );
    assert_eq!(
      result,
      vec![json!({ "f": "10" }), json!({ "f": "9" }), json!({ "f": "x" }), json!({})]
    );
  }

  #[test]
  fn test_date_type() {
    let data = json!([
      { "closing": "2024-06-01" },
      { "closing": "2024-01-15T10:00:00Z" },
      { "closing": "2024-03-01 08:30:00" }
    ]);
    let result = sorted(json!({ "sortField": "closing", "dataType": "date" }), data);
    assert_eq!(result[0]["closing"], "2024-01-15T10:00:00Z");
    assert_eq!(result[2]["closing"], "2024-06-01");
  }

  #[test]
  fn test_stable_for_equal_keys() {
    let data = json!([{ "f": 1, "i": 0 }, { "f": 0, "i": 1 }, { "f": 1, "i": 2 }]);
    let result = sorted(json!({ "sortField": "f" }), data);
    let order: Vec<_> = result.iter().map(|v| v["i"].clone()).collect();
    assert_eq!(order, vec![json!(1), json!(0), json!(2)]);
  }

  #[test]
  fn test_nested_field_and_no_field() {
    let data = json!([{ "a": { "n": 3 } }, { "a": { "n": 1 } }]);
    let result = sorted(json!({ "sortField": "a.n" }), data.clone());
    assert_eq!(result[0]["a"]["n"], 1);

    let unchanged = sorted(json!({}), data);
    assert_eq!(unchanged[0]["a"]["n"], 3);
  }
}
