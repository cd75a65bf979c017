//! Dealflow Runtime
//!
//! This crate executes workflows. The [`Runtime`] walks the node graph from
//! its triggers, resolves `{{@nodeId:Label.path}}` templates against earlier
//! outputs, dispatches action nodes to steps from a
//! [`dealflow_steps::StepRegistry`] and routes Condition and Switch nodes by
//! edge handle.
//!
//! Every run produces a [`WorkflowResult`]; progress is observable through
//! an [`ExecutionNotifier`] and, when a store is configured, the final
//! outcome is written as an execution record.

mod error;
mod events;
mod result;
mod routing;
mod runtime;
mod template;
mod trigger;

pub use error::RuntimeError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use result::{NodeOutput, NodeOutputs, NodeResult, WorkflowResult};
pub use routing::next_edges;
pub use runtime::Runtime;
pub use template::{process_templates, resolve_templates};
pub use trigger::trigger_output;
