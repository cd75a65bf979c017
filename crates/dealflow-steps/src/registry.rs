//! Label-keyed step table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builtin;
use crate::catalog::PluginCatalog;
use crate::step::Step;

/// Action kinds the executor routes differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
  /// Branches on `data.condition`.
  Condition,
  /// Branches on `data.matchedOutput`.
  Switch,
  /// User-authored logic; receives every prior output.
  Code,
  Step,
}

impl ActionKind {
  pub fn from_label(label: &str) -> Self {
    match label {
      builtin::CONDITION => Self::Condition,
      builtin::SWITCH => Self::Switch,
      builtin::CODE => Self::Code,
      _ => Self::Step,
    }
  }
}

/// A step found for an action type.
#[derive(Clone)]
pub struct ResolvedStep {
  /// Registry label the step is stored under.
  pub label: String,
  /// Catalog label when the action type was a plugin id.
  pub catalog_label: Option<String>,
  pub step: Arc<dyn Step>,
}

impl std::fmt::Debug for ResolvedStep {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ResolvedStep")
      .field("label", &self.label)
      .field("catalog_label", &self.catalog_label)
      .finish_non_exhaustive()
  }
}

/// Steps keyed by their human-readable label.
#[derive(Clone, Default)]
pub struct StepRegistry {
  steps: HashMap<String, Arc<dyn Step>>,
}

impl StepRegistry {
  /// An empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// A registry holding every built-in step.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    builtin::register_all(&mut registry);
    registry
  }

  /// Register a step under its own label, replacing any previous entry.
  pub fn register(&mut self, step: impl Step + 'static) {
    let label = step.label().to_string();
    self.steps.insert(label, Arc::new(step));
  }

  /// Register a shared step under an explicit key.
  pub fn register_as(&mut self, key: impl Into<String>, step: Arc<dyn Step>) {
    self.steps.insert(key.into(), step);
  }

  pub fn get(&self, key: &str) -> Option<Arc<dyn Step>> {
    self.steps.get(key).cloned()
  }

  pub fn contains(&self, key: &str) -> bool {
    self.steps.contains_key(key)
  }

  /// Registered keys, sorted.
  pub fn labels(&self) -> Vec<String> {
    let mut labels: Vec<String> = self.steps.keys().cloned().collect();
    labels.sort();
    labels
  }

  /// Look up an action type directly, then as a plugin action id.
  pub fn resolve(&self, action_type: &str, catalog: &dyn PluginCatalog) -> Option<ResolvedStep> {
    if let Some(step) = self.get(action_type) {
      return Some(ResolvedStep {
        label: action_type.to_string(),
        catalog_label: None,
        step,
      });
    }

    let action = catalog.find_action_by_id(action_type)?;
    let step = self.get(&action.label)?;
    Some(ResolvedStep {
      label: action.label.clone(),
      catalog_label: Some(action.label),
      step,
    })
  }

  /// Message reported for an action type nothing resolves.
  pub fn unknown_action_message(&self, action_type: &str) -> String {
    format!(
      "Unknown action type: {}. Available actions: {}",
      action_type,
      self.labels().join(", ")
    )
  }
}

impl std::fmt::Debug for StepRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepRegistry")
      .field("labels", &self.labels())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{CatalogAction, StaticCatalog};

  fn catalog() -> StaticCatalog {
    [CatalogAction {
      id: "core/filter".to_string(),
      label: "Filter".to_string(),
      integration: None,
      description: None,
    }]
    .into_iter()
    .collect()
  }

  #[test]
  fn test_resolve_direct_key() {
    let registry = StepRegistry::with_builtins();
    let resolved = registry.resolve("Sort", &catalog()).unwrap();
    assert_eq!(resolved.label, "Sort");
    assert_eq!(resolved.catalog_label, None);
    assert!(resolved.step.data_aware());
  }

  #[test]
  fn test_resolve_catalog_alias() {
    let registry = StepRegistry::with_builtins();
    let resolved = registry.resolve("core/filter", &catalog()).unwrap();
    assert_eq!(resolved.label, "Filter");
    assert_eq!(resolved.catalog_label.as_deref(), Some("Filter"));
  }

  #[test]
  fn test_resolve_unknown() {
    let registry = StepRegistry::with_builtins();
    assert!(registry.resolve("supabase/get-row", &catalog()).is_none());
  }

  #[test]
  fn test_unknown_action_message_lists_sorted_keys() {
    let mut registry = StepRegistry::new();
    registry.register(builtin::limit());
    registry.register(builtin::filter());

    assert_eq!(
      registry.unknown_action_message("Nope"),
      "Unknown action type: Nope. Available actions: Filter, Limit"
    );
  }

  #[test]
  fn test_action_kind() {
    assert_eq!(ActionKind::from_label("Condition"), ActionKind::Condition);
    assert_eq!(ActionKind::from_label("Switch"), ActionKind::Switch);
    assert_eq!(ActionKind::from_label("Code"), ActionKind::Code);
    assert_eq!(ActionKind::from_label("Filter"), ActionKind::Step);
  }
}
