//! The step contract.

use async_trait::async_trait;
use dealflow_items::value::display_string;
use dealflow_items::{NODE_ITEMS_KEY, NODE_OUTPUTS_KEY, UpstreamData, WorkflowItem};
use dealflow_items::{get_input_branches, get_input_items};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::StepError;

/// Input key carrying the [`StepContext`].
pub const CONTEXT_KEY: &str = "_context";

/// Identifies the run and node a step is executing for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepContext {
  pub execution_id: String,
  pub node_id: String,
  pub node_name: String,
  pub node_type: String,
}

/// Everything a step receives for one invocation.
#[derive(Debug, Clone, Default)]
pub struct StepInput {
  /// The node's configuration after template resolution.
  pub fields: Map<String, Value>,
  pub context: StepContext,
  /// Upstream items (`_nodeItems`) and/or raw outputs (`_nodeOutputs`).
  pub upstream: UpstreamData,
}

impl StepInput {
  pub fn new(fields: Map<String, Value>, context: StepContext) -> Self {
    Self {
      fields,
      context,
      upstream: UpstreamData::default(),
    }
  }

  pub fn with_upstream(mut self, upstream: UpstreamData) -> Self {
    self.upstream = upstream;
    self
  }

  /// Split a single JSON input object into fields, context and upstream data.
  pub fn from_value(value: Value) -> Self {
    let Value::Object(mut fields) = value else {
      return Self::default();
    };
    let upstream = UpstreamData::from_input(&fields);
    fields.shift_remove(NODE_ITEMS_KEY);
    fields.shift_remove(NODE_OUTPUTS_KEY);
    let context = fields
      .shift_remove(CONTEXT_KEY)
      .and_then(|c| serde_json::from_value(c).ok())
      .unwrap_or_default();

    Self {
      fields,
      context,
      upstream,
    }
  }

  /// The merged single-object form: fields plus `_context`, `_nodeItems`
  /// and `_nodeOutputs` when present.
  pub fn to_value(&self) -> Value {
    let mut obj = self.fields.clone();
    obj.insert(
      CONTEXT_KEY.to_string(),
      serde_json::to_value(&self.context).unwrap_or(Value::Null),
    );
    if let Some(items) = self.upstream.node_items_value() {
      obj.insert(NODE_ITEMS_KEY.to_string(), items);
    }
    if let Some(outputs) = &self.upstream.node_outputs {
      obj.insert(NODE_OUTPUTS_KEY.to_string(), Value::Object(outputs.clone()));
    }
    Value::Object(obj)
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.fields.get(key)
  }

  /// A field as a string. Null and missing fields are `None`; empty strings
  /// are kept.
  pub fn string(&self, key: &str) -> Option<String> {
    match self.fields.get(key) {
      None | Some(Value::Null) => None,
      Some(value) => Some(display_string(value)),
    }
  }

  /// A non-empty string field.
  pub fn non_empty(&self, key: &str) -> Option<String> {
    self.string(key).filter(|s| !s.is_empty())
  }

  /// A boolean switch that is on unless set to `false` or `"false"`.
  pub fn flag_enabled(&self, key: &str) -> bool {
    !matches!(self.fields.get(key), Some(Value::Bool(false)))
      && self.string(key).is_none_or(|s| s != "false")
  }

  /// Upstream items as one flat, non-empty list.
  pub fn items(&self) -> Vec<WorkflowItem> {
    get_input_items(&self.upstream)
  }

  /// Upstream items grouped by source node.
  pub fn branches(&self) -> Vec<(String, Vec<WorkflowItem>)> {
    get_input_branches(&self.upstream)
  }
}

/// Executable behavior behind an action node.
///
/// Steps are never retried by the engine; a failed step fails its node and
/// the workflow has to be run again.
#[async_trait]
pub trait Step: Send + Sync {
  /// Registry label, e.g. `"Filter"`.
  fn label(&self) -> &str;

  /// Whether the engine should inject upstream items (`_nodeItems`).
  fn data_aware(&self) -> bool {
    false
  }

  fn max_retries(&self) -> u32 {
    0
  }

  async fn run(&self, input: StepInput) -> Result<Value, StepError>;
}

/// A synchronous, pure transformation over upstream items.
pub trait ItemStep: Send + Sync {
  fn label(&self) -> &'static str;

  fn process(&self, input: &StepInput) -> Result<Value, StepError>;
}

/// Adapts an [`ItemStep`] to the async [`Step`] contract.
#[derive(Debug, Clone, Default)]
pub struct DataAware<S>(pub S);

#[async_trait]
impl<S: ItemStep> Step for DataAware<S> {
  fn label(&self) -> &str {
    self.0.label()
  }

  fn data_aware(&self) -> bool {
    true
  }

  async fn run(&self, input: StepInput) -> Result<Value, StepError> {
    debug!(
      step = self.0.label(),
      node_id = %input.context.node_id,
      "data_step_started"
    );
    let result = self.0.process(&input);
    match &result {
      Ok(output) => debug!(
        step = self.0.label(),
        node_id = %input.context.node_id,
        count = ?output.get("count"),
        "data_step_completed"
      ),
      Err(e) => debug!(
        step = self.0.label(),
        node_id = %input.context.node_id,
        error = %e,
        "data_step_failed"
      ),
    }
    result
  }
}

/// Outcome of one step invocation as recorded by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
  Success(Value),
  Failure(String),
}

impl StepResult {
  /// Classify a returned value: `{success: false, error}` is a declared
  /// failure, anything else succeeds with the whole value as data.
  pub fn from_output(output: Value) -> Self {
    if let Value::Object(obj) = &output
      && obj.get("success") == Some(&Value::Bool(false))
    {
      return Self::Failure(error_message(obj.get("error")));
    }
    Self::Success(output)
  }

  pub fn from_error(error: &StepError) -> Self {
    Self::Failure(error.to_string())
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success(_))
  }
}

impl From<Result<Value, StepError>> for StepResult {
  fn from(result: Result<Value, StepError>) -> Self {
    match result {
      Ok(output) => Self::from_output(output),
      Err(e) => Self::from_error(&e),
    }
  }
}

/// Extract a message from an `error` that is a string or `{message}`.
fn error_message(error: Option<&Value>) -> String {
  match error {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Object(obj)) => match obj.get("message") {
      Some(Value::String(s)) => s.clone(),
      _ => Value::Object(obj.clone()).to_string(),
    },
    None | Some(Value::Null) => "step failed".to_string(),
    Some(other) => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_declared_failure_with_string_error() {
    let result = StepResult::from_output(json!({ "success": false, "error": "row not found" }));
    assert_eq!(result, StepResult::Failure("row not found".to_string()));
  }

  #[test]
  fn test_declared_failure_with_message_object() {
    let result = StepResult::from_output(json!({
      "success": false,
      "error": { "message": "Unknown action type: Foo" }
    }));
    assert_eq!(result, StepResult::Failure("Unknown action type: Foo".to_string()));
  }

  #[test]
  fn test_envelope_success_keeps_whole_value() {
    let output = json!({ "success": true, "data": { "id": 1 } });
    assert_eq!(StepResult::from_output(output.clone()), StepResult::Success(output));
  }

  #[test]
  fn test_plain_value_is_success() {
    assert!(StepResult::from_output(json!([1, 2])).is_success());
    assert!(StepResult::from_output(json!({ "success": "false" })).is_success());
  }

  #[test]
  fn test_step_error_is_failure() {
    let result: StepResult = Err(StepError::invalid_input("endpoint", "required")).into();
    assert_eq!(
      result,
      StepResult::Failure("invalid input 'endpoint': required".to_string())
    );
  }

  #[test]
  fn test_input_value_round_trip() {
    let value = json!({
      "maxItems": "2",
      "_context": { "executionId": "ex", "nodeId": "n", "nodeName": "Limit", "nodeType": "Limit" },
      "_nodeOutputs": { "prev": [1] }
    });

    let input = StepInput::from_value(value.clone());
    assert_eq!(input.fields.len(), 1);
    assert_eq!(input.context.node_name, "Limit");
    assert_eq!(input.items()[0].json["value"], 1);
    assert_eq!(input.to_value(), value);
  }

  #[test]
  fn test_field_helpers() {
    let input = StepInput::from_value(json!({
      "a": 3,
      "b": "",
      "c": null,
      "off": "false",
      "offBool": false
    }));

    assert_eq!(input.string("a").as_deref(), Some("3"));
    assert_eq!(input.string("b").as_deref(), Some(""));
    assert_eq!(input.non_empty("b"), None);
    assert_eq!(input.string("c"), None);
    assert!(!input.flag_enabled("off"));
    assert!(!input.flag_enabled("offBool"));
    assert!(input.flag_enabled("missing"));
  }
}
