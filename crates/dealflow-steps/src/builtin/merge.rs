use dealflow_items::WorkflowItem;
use serde_json::{Map, Value, json};

use super::{MERGE, items_value};
use crate::error::StepError;
use crate::step::{ItemStep, StepInput};

/// Joins the items of several upstream branches.
///
/// `append` concatenates branches in upstream order. `combineByPosition`
/// zips them by index, later branches overwriting earlier keys.
///
/// A node runs once, on the first branch to reach it, so inside a run only
/// upstream outputs recorded by then are merged. Branches that finish later
/// are not waited for.
#[derive(Debug, Clone, Copy, Default)]
pub struct Merge;

impl ItemStep for Merge {
  fn label(&self) -> &'static str {
    MERGE
  }

  fn process(&self, input: &StepInput) -> Result<Value, StepError> {
    let branches = input.branches();
    if branches.is_empty() {
      let items = input.items();
      return Ok(json!({ "items": items_value(&items), "count": items.len() }));
    }

    let merged: Vec<WorkflowItem> = match input.string("mode").as_deref() {
      None | Some("append") => branches.into_iter().flat_map(|(_, items)| items).collect(),
      Some("combineByPosition") => combine_by_position(&branches),
      Some(other) => {
        return Err(StepError::invalid_input(
          "mode",
          format!("unknown merge mode: {}", other),
        ));
      }
    };

    Ok(json!({ "items": items_value(&merged), "count": merged.len() }))
  }
}

fn combine_by_position(branches: &[(String, Vec<WorkflowItem>)]) -> Vec<WorkflowItem> {
  let len = branches.iter().map(|(_, items)| items.len()).max().unwrap_or(0);
  (0..len)
    .map(|i| {
      let mut json = Map::new();
      for (_, items) in branches {
        if let Some(item) = items.get(i) {
          json.extend(item.json.clone());
        }
      }
      WorkflowItem::new(json)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::builtin::test_support::item_json;
  use dealflow_items::UpstreamData;

  fn two_branches(mode: Option<&str>) -> StepInput {
    let fields = match mode {
      Some(mode) => json!({ "mode": mode }),
      None => json!({}),
    };
    let left = json!([{ "id": 1, "name": "ann" }, { "id": 2, "name": "bo" }]);
    let right = json!([{ "id": 1, "score": 700 }]);
    StepInput::from_value(fields)
      .with_upstream(UpstreamData::from_outputs([("left", &left), ("right", &right)]))
  }

  #[test]
  fn test_append() {
    let output = Merge.process(&two_branches(None)).unwrap();
    assert_eq!(output["count"], 3);
    assert_eq!(item_json(&output)[2], json!({ "id": 1, "score": 700 }));
  }

  #[test]
  fn test_combine_by_position() {
    let output = Merge.process(&two_branches(Some("combineByPosition"))).unwrap();
    assert_eq!(
      item_json(&output),
      vec![
        json!({ "id": 1, "name": "ann", "score": 700 }),
        json!({ "id": 2, "name": "bo" })
      ]
    );
  }

  #[test]
  fn test_unknown_mode() {
    assert!(Merge.process(&two_branches(Some("zip"))).is_err());
  }
}
