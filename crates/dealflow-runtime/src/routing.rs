//! Choosing which outgoing edges a finished node follows.

use dealflow_config::EdgeDef;
use dealflow_items::value::display_string;
use dealflow_steps::ActionKind;
use dealflow_steps::builtin::DEFAULT_OUTPUT;
use serde_json::Value;

/// Edges to follow after a node succeeded with `data`.
///
/// Condition nodes follow `"true"` edges when `data.condition` is exactly
/// `true` (or every edge when none carries a handle) and `"false"` edges
/// otherwise. Switch nodes follow edges whose handle equals
/// `data.matchedOutput`, else `"default"` edges. Everything else fans out.
pub fn next_edges<'a>(kind: ActionKind, data: &Value, edges: &'a [EdgeDef]) -> Vec<&'a EdgeDef> {
  match kind {
    ActionKind::Condition => {
      let passed = data.get("condition") == Some(&Value::Bool(true));
      let any_handle = edges.iter().any(|e| e.source_handle.is_some());
      match (passed, any_handle) {
        (true, false) => edges.iter().collect(),
        (true, true) => with_handle(edges, "true"),
        (false, _) => with_handle(edges, "false"),
      }
    }
    ActionKind::Switch => {
      let matched = data
        .get("matchedOutput")
        .filter(|v| !v.is_null())
        .map(display_string);
      let exact = matched
        .as_deref()
        .map(|handle| with_handle(edges, handle))
        .unwrap_or_default();
      if exact.is_empty() {
        with_handle(edges, DEFAULT_OUTPUT)
      } else {
        exact
      }
    }
    ActionKind::Code | ActionKind::Step => edges.iter().collect(),
  }
}

fn with_handle<'a>(edges: &'a [EdgeDef], handle: &str) -> Vec<&'a EdgeDef> {
  edges
    .iter()
    .filter(|e| e.source_handle.as_deref() == Some(handle))
    .collect()
}
