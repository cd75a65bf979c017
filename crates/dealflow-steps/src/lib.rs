//! Dealflow Steps
//!
//! A step is the unit of executable behavior behind an action node. Steps
//! receive a [`StepInput`] (the node's resolved configuration plus injected
//! run context and upstream data) and return a plain JSON value.
//!
//! Steps are registered by their human-readable label in a [`StepRegistry`].
//! Action nodes may also name a namespaced plugin action id (for example
//! `"supabase/get-row"`); a [`PluginCatalog`] translates such ids to the
//! registry label.
//!
//! Built-in steps live in [`builtin`]: the data-aware item steps (filter,
//! sort, limit, aggregate, remove duplicates, split out, merge), the branching
//! steps (condition, switch) and an HTTP request step.

pub mod builtin;
mod catalog;
mod condition;
mod error;
mod registry;
mod step;

pub use catalog::{CatalogAction, PluginCatalog, StaticCatalog};
pub use condition::{ConditionGroup, ConditionRow, DataType, MatchMode};
pub use error::StepError;
pub use registry::{ActionKind, ResolvedStep, StepRegistry};
pub use step::{CONTEXT_KEY, DataAware, ItemStep, Step, StepContext, StepInput, StepResult};
