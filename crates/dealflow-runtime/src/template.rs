//! Cross-node template references.
//!
//! String config values may embed `{{@nodeId:Label.path}}`. The node id is
//! sanitized and looked up in the run outputs; the label is informational
//! and the path walks the node's data with dot segments and `[n]` indices.
//!
//! Text is scanned once, left to right. Substituted values are never
//! rescanned, so a value that itself contains `{{@...}}` is inserted as-is.

use dealflow_items::value::{parse_int, template_string};
use dealflow_workflow::sanitize_id;
use serde_json::{Map, Value};

use crate::result::NodeOutputs;

const OPEN: &str = "{{@";
const CLOSE: &str = "}}";

/// First path segments that address the envelope itself.
const ENVELOPE_KEYS: [&str; 3] = ["success", "data", "error"];

/// Resolve templates in every top-level string field of `config`.
///
/// Non-string fields are copied unchanged.
pub fn process_templates(config: &Map<String, Value>, outputs: &NodeOutputs) -> Map<String, Value> {
  config
    .iter()
    .map(|(key, value)| {
      let value = match value {
        Value::String(text) => Value::String(resolve_templates(text, outputs)),
        other => other.clone(),
      };
      (key.clone(), value)
    })
    .collect()
}

/// Substitute every `{{@nodeId:Label.path}}` in `text`.
///
/// References that cannot be resolved stay in the text verbatim.
pub fn resolve_templates(text: &str, outputs: &NodeOutputs) -> String {
  let mut result = String::with_capacity(text.len());
  let mut rest = text;

  while let Some(start) = rest.find(OPEN) {
    let body_start = start + OPEN.len();
    let Some(body_len) = rest[body_start..].find(CLOSE) else {
      break;
    };
    let end = body_start + body_len + CLOSE.len();
    let placeholder = &rest[start..end];

    result.push_str(&rest[..start]);
    match resolve_reference(&rest[body_start..body_start + body_len], outputs) {
      Some(value) => result.push_str(&value),
      None => result.push_str(placeholder),
    }
    rest = &rest[end..];
  }

  result.push_str(rest);
  result
}

/// Resolve `nodeId:Label.path`. `None` leaves the placeholder in place.
fn resolve_reference(body: &str, outputs: &NodeOutputs) -> Option<String> {
  let (node_id, label_and_path) = body.split_once(':')?;
  let output = outputs.get(&sanitize_id(node_id))?;

  let Some((_label, path)) = label_and_path.split_once('.') else {
    return Some(template_string(&output.data));
  };
  let segments = parse_path(path)?;

  let mut current = &output.data;
  if let Some(first) = segments.first()
    && is_envelope(current)
    && !ENVELOPE_KEYS.contains(&first.field.as_str())
  {
    current = &current["data"];
  }

  Some(walk(current, &segments).map(template_string).unwrap_or_default())
}

fn is_envelope(value: &Value) -> bool {
  value
    .as_object()
    .is_some_and(|obj| obj.contains_key("success") && obj.contains_key("data"))
}

/// One `field[i][j]` path segment.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
  field: String,
  indices: Vec<String>,
}

/// Parse `a.b[0].c[1][2]`. `None` on an unterminated bracket.
fn parse_path(path: &str) -> Option<Vec<Segment>> {
  let mut parser = PathParser {
    chars: path.chars().peekable(),
  };
  parser.path()
}

struct PathParser<'a> {
  chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl PathParser<'_> {
  // path := segment ('.' segment)*
  fn path(&mut self) -> Option<Vec<Segment>> {
    let mut segments = vec![self.segment()?];
    while self.chars.next_if_eq(&'.').is_some() {
      segments.push(self.segment()?);
    }
    Some(segments)
  }

  // segment := field ('[' index ']')*
  fn segment(&mut self) -> Option<Segment> {
    let mut field = String::new();
    while let Some(c) = self.chars.next_if(|c| *c != '.' && *c != '[') {
      field.push(c);
    }

    let mut indices = Vec::new();
    while self.chars.next_if_eq(&'[').is_some() {
      let mut index = String::new();
      loop {
        match self.chars.next()? {
          ']' => break,
          c => index.push(c),
        }
      }
      indices.push(index);
    }

    Some(Segment { field, indices })
  }
}

/// Walk `segments` from `root`. `None` as soon as a step leaves the data.
fn walk<'a>(root: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
  let mut current = root;
  for segment in segments {
    if !segment.field.is_empty() {
      current = current.as_object()?.get(&segment.field)?;
    }
    for index in &segment.indices {
      let index = usize::try_from(parse_int(&Value::String(index.clone()))?).ok()?;
      current = current.as_array()?.get(index)?;
    }
  }
  Some(current)
}
