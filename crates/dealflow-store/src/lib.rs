//! Dealflow Store
//!
//! The execution record is the only state a run leaves behind: one row per
//! execution holding its final status, aggregated output and timing. The
//! executor writes it once, on completion, and never retries the write.
//!
//! [`SqliteStore`] persists records with sqlx; [`MemoryStore`] keeps them in
//! process for tests and one-off runs.

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use sqlx::types::Json;
pub use types::{ExecutionRecord, ExecutionStatus};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

/// Storage for completed execution records.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
  /// Write the final record for an execution, replacing any earlier one
  /// with the same id.
  async fn complete_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError>;

  /// Get an execution record by id.
  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError>;

  /// Records for a workflow, most recent first.
  async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError>;
}
