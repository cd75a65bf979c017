//! Dealflow Workflow
//!
//! This crate provides the indexed workflow representation used by the
//! executor. A [`Workflow`] wraps an editor [`WorkflowDef`](dealflow_config::WorkflowDef)
//! with lookup tables:
//! - node lookup by raw id and by sanitized id
//! - outgoing edges per node (in definition order, with their `sourceHandle`)
//! - entry points (trigger nodes with no incoming edges)
//!
//! Building a `Workflow` never fails. Dangling edges are tolerated and simply
//! lead nowhere at execution time; [`Workflow::validate`] reports them for
//! callers that want to be strict.

mod error;
mod graph;
mod sanitize;
mod workflow;

pub use error::WorkflowError;
pub use graph::Graph;
pub use sanitize::sanitize_id;
pub use workflow::Workflow;
