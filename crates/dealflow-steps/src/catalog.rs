//! Plugin catalog lookups.
//!
//! Integration plugins publish actions under namespaced ids such as
//! `"supabase/get-row"`. The executor only needs the registry label an id
//! maps to.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One action published by an integration plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogAction {
  pub id: String,
  /// Registry label the action runs under.
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub integration: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

/// Resolves namespaced action ids to catalog entries.
pub trait PluginCatalog: Send + Sync {
  fn find_action_by_id(&self, id: &str) -> Option<CatalogAction>;
}

/// A catalog held in memory, typically loaded from a JSON list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
  actions: HashMap<String, CatalogAction>,
}

impl StaticCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a JSON array of [`CatalogAction`]s.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    let actions: Vec<CatalogAction> = serde_json::from_str(json)?;
    Ok(actions.into_iter().collect())
  }

  pub fn insert(&mut self, action: CatalogAction) {
    self.actions.insert(action.id.clone(), action);
  }

  pub fn len(&self) -> usize {
    self.actions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.actions.is_empty()
  }
}

impl FromIterator<CatalogAction> for StaticCatalog {
  fn from_iter<I: IntoIterator<Item = CatalogAction>>(iter: I) -> Self {
    let mut catalog = Self::new();
    for action in iter {
      catalog.insert(action);
    }
    catalog
  }
}

impl PluginCatalog for StaticCatalog {
  fn find_action_by_id(&self, id: &str) -> Option<CatalogAction> {
    self.actions.get(id).cloned()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_from_json() {
    let catalog = StaticCatalog::from_json(
      r#"[
        { "id": "supabase/get-row", "label": "Get Row", "integration": "supabase" },
        { "id": "http/request", "label": "HTTP Request" }
      ]"#,
    )
    .unwrap();

    assert_eq!(catalog.len(), 2);
    let action = catalog.find_action_by_id("supabase/get-row").unwrap();
    assert_eq!(action.label, "Get Row");
    assert_eq!(action.integration.as_deref(), Some("supabase"));
    assert!(catalog.find_action_by_id("Get Row").is_none());
  }

  #[test]
  fn test_from_json_rejects_non_list() {
    assert!(StaticCatalog::from_json(r#"{ "id": "x" }"#).is_err());
  }
}
