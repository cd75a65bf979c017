//! Branching steps. The executor routes on their output.

use async_trait::async_trait;
use dealflow_items::value::display_string;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{CONDITION, SWITCH};
use crate::condition::ConditionGroup;
use crate::error::StepError;
use crate::step::{Step, StepInput};

/// Evaluates `condition` to `{condition: bool}`.
///
/// Accepts a boolean, a `"true"`/`"false"` string or a structured
/// condition group.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionStep;

#[async_trait]
impl Step for ConditionStep {
  fn label(&self) -> &str {
    CONDITION
  }

  async fn run(&self, input: StepInput) -> Result<Value, StepError> {
    let condition = match input.get("condition") {
      None | Some(Value::Null) => {
        return Err(StepError::invalid_input("condition", "a condition is required"));
      }
      Some(value) => evaluate(value),
    };
    Ok(json!({ "condition": condition }))
  }
}

fn evaluate(value: &Value) -> bool {
  match value {
    Value::Bool(b) => *b,
    Value::String(s) if s.trim().eq_ignore_ascii_case("true") => true,
    Value::String(s) if s.trim().eq_ignore_ascii_case("false") => false,
    other => ConditionGroup::from_value(other).is_some_and(|group| group.evaluate()),
  }
}

/// Picks an output handle by matching `value` against `cases`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchStep;

/// Handle followed when no case matches.
pub const DEFAULT_OUTPUT: &str = "default";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SwitchCase {
  Full {
    value: Value,
    #[serde(default)]
    output: Option<String>,
  },
  Bare(Value),
}

impl SwitchCase {
  fn value(&self) -> String {
    match self {
      Self::Full { value, .. } | Self::Bare(value) => display_string(value),
    }
  }

  fn output(&self) -> String {
    match self {
      Self::Full {
        output: Some(output),
        ..
      } if !output.is_empty() => output.clone(),
      _ => self.value(),
    }
  }
}

#[async_trait]
impl Step for SwitchStep {
  fn label(&self) -> &str {
    SWITCH
  }

  async fn run(&self, input: StepInput) -> Result<Value, StepError> {
    let value = input.string("value").unwrap_or_default();
    let cases = parse_cases(input.get("cases"))?;

    let matched = cases
      .iter()
      .find(|case| case.value() == value)
      .map_or_else(|| DEFAULT_OUTPUT.to_string(), SwitchCase::output);

    Ok(json!({ "matchedOutput": matched, "value": value }))
  }
}

fn parse_cases(cases: Option<&Value>) -> Result<Vec<SwitchCase>, StepError> {
  let parsed = match cases {
    None | Some(Value::Null) => return Ok(Vec::new()),
    Some(Value::String(text)) if text.trim().is_empty() => return Ok(Vec::new()),
    Some(Value::String(text)) => serde_json::from_str(text),
    Some(other) => serde_json::from_value(other.clone()),
  };
  parsed.map_err(|e| StepError::invalid_input("cases", e.to_string()))
}
