//! Runtime error types.
//!
//! Node-level failures are recorded in the run result and never surface
//! here; these errors end a whole invocation.

/// Errors that can occur during runtime execution.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// Execution was cancelled.
  #[error("execution cancelled")]
  Cancelled,

  /// Invalid workflow graph structure.
  #[error("invalid graph: {message}")]
  InvalidGraph { message: String },

  /// Input passed to the runtime has the wrong shape.
  #[error("invalid input: {message}")]
  InvalidInput { message: String },

  /// No node with this id exists in the workflow.
  #[error("node '{0}' not found in workflow")]
  NodeNotFound(String),

  /// The node's kind cannot be executed.
  #[error("node '{node_id}' has an unsupported type")]
  UnsupportedNode { node_id: String },
}
