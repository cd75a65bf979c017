//! Structured conditions shared by the Filter and Condition steps.

use dealflow_items::value::{display_string, parse_date, parse_float};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How condition rows combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
  #[default]
  And,
  Or,
}

/// Type a row's operands are compared as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
  #[default]
  String,
  Number,
  Boolean,
  Date,
  /// Unrecognized types compare as strings.
  #[serde(other)]
  Other,
}

/// A single `leftValue <operator> rightValue` comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRow {
  #[serde(default)]
  pub left_value: Value,
  #[serde(default)]
  pub operator: String,
  #[serde(default)]
  pub right_value: Value,
  #[serde(default)]
  pub data_type: DataType,
}

/// `{match, conditions}` as authored in the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
  #[serde(rename = "match", default)]
  pub mode: MatchMode,
  #[serde(default)]
  pub conditions: Vec<ConditionRow>,
}

impl ConditionGroup {
  /// Parse a condition from its JSON string form. `None` when the text is
  /// not a condition object.
  pub fn parse(text: &str) -> Option<Self> {
    serde_json::from_str(text).ok()
  }

  /// Parse a condition that is either a JSON string or an inline object.
  pub fn from_value(value: &Value) -> Option<Self> {
    match value {
      Value::String(text) => Self::parse(text),
      Value::Object(_) => serde_json::from_value(value.clone()).ok(),
      _ => None,
    }
  }

  /// All rows for `and`, any row for `or`. An empty `and` group holds, an
  /// empty `or` group does not.
  pub fn evaluate(&self) -> bool {
    match self.mode {
      MatchMode::And => self.conditions.iter().all(ConditionRow::evaluate),
      MatchMode::Or => self.conditions.iter().any(ConditionRow::evaluate),
    }
  }
}

impl ConditionRow {
  pub fn new(left: Value, operator: &str, right: Value, data_type: DataType) -> Self {
    Self {
      left_value: left,
      operator: operator.to_string(),
      right_value: right,
      data_type,
    }
  }

  /// Unknown operators evaluate to `false`.
  pub fn evaluate(&self) -> bool {
    match self.data_type {
      DataType::Number => self.compare_numbers(),
      DataType::Boolean => self.compare_booleans(),
      DataType::Date => self.compare_dates(),
      DataType::String | DataType::Other => self.compare_strings(),
    }
  }

  fn compare_strings(&self) -> bool {
    let left = operand_string(&self.left_value);
    let right = operand_string(&self.right_value);
    match self.operator.as_str() {
      "equals" => left == right,
      "not_equals" => left != right,
      "contains" => left.contains(&right),
      "not_contains" => !left.contains(&right),
      "starts_with" => left.starts_with(&right),
      "ends_with" => left.ends_with(&right),
      "is_empty" => left.is_empty(),
      "is_not_empty" => !left.is_empty(),
      _ => false,
    }
  }

  fn compare_numbers(&self) -> bool {
    let left = parse_float(&self.left_value);
    let right = parse_float(&self.right_value);
    if left.is_nan() || right.is_nan() {
      return false;
    }
    match self.operator.as_str() {
      "equals" => left == right,
      "not_equals" => left != right,
      "greater_than" => left > right,
      "greater_than_or_equal" => left >= right,
      "less_than" => left < right,
      "less_than_or_equal" => left <= right,
      _ => false,
    }
  }

  fn compare_booleans(&self) -> bool {
    let left = truthy(&self.left_value);
    match self.operator.as_str() {
      "is_true" => left,
      "is_false" => !left,
      "equals" => left == truthy(&self.right_value),
      "not_equals" => left != truthy(&self.right_value),
      _ => false,
    }
  }

  fn compare_dates(&self) -> bool {
    let (Some(left), Some(right)) = (parse_date(&self.left_value), parse_date(&self.right_value))
    else {
      return false;
    };
    match self.operator.as_str() {
      "equals" => left == right,
      "is_after" => left > right,
      "is_before" => left < right,
      _ => false,
    }
  }
}

fn operand_string(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    other => display_string(other),
  }
}

/// `true`, `"true"` and non-zero numbers count as true.
fn truthy(value: &Value) -> bool {
  match value {
    Value::Bool(b) => *b,
    Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    _ => false,
  }
}
