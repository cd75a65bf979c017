//! Trigger data synthesis.

use dealflow_config::{NodeDef, WEBHOOK_MOCK_KEY};
use serde_json::{Map, Value};
use tracing::warn;

/// Trigger type that falls back to a configured mock request.
const WEBHOOK_TRIGGER: &str = "Webhook";

/// Build a trigger node's output: `{triggered: true, timestamp}` overlaid
/// with the external trigger input.
///
/// When no input (or an empty object) is supplied and the trigger is a
/// webhook, the parsed `webhookMockRequest` config is overlaid instead.
pub fn trigger_output(node: &NodeDef, input: Option<&Map<String, Value>>, timestamp_ms: i64) -> Value {
  let mut data = Map::new();
  data.insert("triggered".to_string(), Value::Bool(true));
  data.insert("timestamp".to_string(), Value::from(timestamp_ms));

  match input.filter(|input| !input.is_empty()) {
    Some(input) => data.extend(input.clone()),
    None if node.trigger_type() == Some(WEBHOOK_TRIGGER) => {
      if let Some(mock) = webhook_mock(node) {
        data.extend(mock);
      }
    }
    None => {}
  }

  Value::Object(data)
}

/// The mock request, given as JSON text or an inline object.
fn webhook_mock(node: &NodeDef) -> Option<Map<String, Value>> {
  match node.data.config.get(WEBHOOK_MOCK_KEY)? {
    Value::Object(mock) => Some(mock.clone()),
    Value::String(text) if text.trim().is_empty() => None,
    Value::String(text) => match serde_json::from_str(text) {
      Ok(Value::Object(mock)) => Some(mock),
      Ok(_) | Err(_) => {
        warn!(node_id = %node.id, "webhook_mock_invalid");
        None
      }
    },
    _ => None,
  }
}
