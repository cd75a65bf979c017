//! Built-in steps.
//!
//! The item steps are pure functions over upstream items and are wrapped in
//! [`DataAware`] so the executor injects `_nodeItems` for them. Condition,
//! Switch and HTTP Request read only their configured fields.

mod aggregate;
mod branch;
mod filter;
mod http;
mod limit;
mod merge;
mod remove_duplicates;
mod sort;
mod split_out;

use dealflow_items::WorkflowItem;
use serde_json::Value;

pub use aggregate::Aggregate;
pub use branch::{ConditionStep, DEFAULT_OUTPUT, SwitchStep};
pub use filter::Filter;
pub use http::HttpRequestStep;
pub use limit::Limit;
pub use merge::Merge;
pub use remove_duplicates::RemoveDuplicates;
pub use sort::Sort;
pub use split_out::SplitOut;

use crate::registry::StepRegistry;
use crate::step::DataAware;

pub const FILTER: &str = "Filter";
pub const SORT: &str = "Sort";
pub const LIMIT: &str = "Limit";
pub const AGGREGATE: &str = "Aggregate";
pub const REMOVE_DUPLICATES: &str = "Remove Duplicates";
pub const SPLIT_OUT: &str = "Split Out";
pub const MERGE: &str = "Merge";
pub const CONDITION: &str = "Condition";
pub const SWITCH: &str = "Switch";
pub const HTTP_REQUEST: &str = "HTTP Request";
/// User-authored logic. Not built in; hosts register their own.
pub const CODE: &str = "Code";

pub fn filter() -> DataAware<Filter> {
  DataAware(Filter)
}

pub fn sort() -> DataAware<Sort> {
  DataAware(Sort)
}

pub fn limit() -> DataAware<Limit> {
  DataAware(Limit)
}

pub fn aggregate() -> DataAware<Aggregate> {
  DataAware(Aggregate)
}

pub fn remove_duplicates() -> DataAware<RemoveDuplicates> {
  DataAware(RemoveDuplicates)
}

pub fn split_out() -> DataAware<SplitOut> {
  DataAware(SplitOut)
}

pub fn merge() -> DataAware<Merge> {
  DataAware(Merge)
}

/// Register every built-in step under its label.
pub fn register_all(registry: &mut StepRegistry) {
  registry.register(filter());
  registry.register(sort());
  registry.register(limit());
  registry.register(aggregate());
  registry.register(remove_duplicates());
  registry.register(split_out());
  registry.register(merge());
  registry.register(ConditionStep);
  registry.register(SwitchStep);
  registry.register(HttpRequestStep::new());
}

/// Items in their `[{json: {...}}]` output form.
fn items_value(items: &[WorkflowItem]) -> Value {
  Value::Array(items.iter().map(WorkflowItem::to_value).collect())
}

/// `{success: false, error}` for failures a step reports rather than raises.
fn declared_failure(message: impl Into<String>) -> Value {
  serde_json::json!({ "success": false, "error": message.into() })
}
