use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Final status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Success,
  Error,
}

impl ExecutionStatus {
  pub fn from_success(success: bool) -> Self {
    if success { Self::Success } else { Self::Error }
  }
}

/// A completed execution as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionRecord {
  pub execution_id: String,
  pub workflow_id: Option<String>,
  pub status: ExecutionStatus,
  /// `{results, outputs}` of the run.
  pub output: Option<Json<serde_json::Value>>,
  pub error: Option<String>,
  pub completed_at: DateTime<Utc>,
  pub duration_ms: i64,
}
