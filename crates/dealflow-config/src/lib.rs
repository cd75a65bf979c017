//! Dealflow Config
//!
//! Serializable workflow definitions as produced by the visual workflow
//! editor and stored as JSON blobs. These types describe the graph before it
//! is indexed for execution by `dealflow-workflow`.
//!
//! Field names follow the editor's camelCase wire format:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "id": "t1", "type": "trigger", "data": { "label": "Webhook", "type": "trigger",
//!       "config": { "triggerType": "Webhook" } } },
//!     { "id": "a1", "type": "action", "data": { "label": "Check Score", "type": "action",
//!       "config": { "actionType": "Condition", "condition": "true" } } }
//!   ],
//!   "edges": [ { "id": "e1", "source": "t1", "target": "a1" } ]
//! }
//! ```

mod edge;
mod node;
mod workflow;

pub use edge::EdgeDef;
pub use node::{NodeData, NodeDef, NodeKind};
pub use workflow::WorkflowDef;

/// Config key selecting an action node's step.
pub const ACTION_TYPE_KEY: &str = "actionType";

/// Config key selecting a trigger node's behavior.
pub const TRIGGER_TYPE_KEY: &str = "triggerType";

/// Config key holding a webhook trigger's mock request body.
pub const WEBHOOK_MOCK_KEY: &str = "webhookMockRequest";
