use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{ExecutionRecord, ExecutionStore, StoreError};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Connect to `url`, creating the database file if needed.
  pub async fn connect(url: &str) -> Result<Self, StoreError> {
    use sqlx::sqlite::SqliteConnectOptions;
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;
    Ok(Self::new(pool))
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await
  }
}

#[async_trait]
impl ExecutionStore for SqliteStore {
  async fn complete_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflow_executions (execution_id, workflow_id, status, output, error, completed_at, duration_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (execution_id) DO UPDATE SET
              workflow_id = excluded.workflow_id,
              status = excluded.status,
              output = excluded.output,
              error = excluded.error,
              completed_at = excluded.completed_at,
              duration_ms = excluded.duration_ms
            "#,
    )
    .bind(&record.execution_id)
    .bind(&record.workflow_id)
    .bind(record.status)
    .bind(&record.output)
    .bind(&record.error)
    .bind(record.completed_at)
    .bind(record.duration_ms)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError> {
    sqlx::query_as(
      r#"
            SELECT execution_id, workflow_id, status, output, error, completed_at, duration_ms
            FROM workflow_executions
            WHERE execution_id = ?
            "#,
    )
    .bind(execution_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(execution_id.to_string()))
  }

  async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
    let records = sqlx::query_as(
      r#"
            SELECT execution_id, workflow_id, status, output, error, completed_at, duration_ms
            FROM workflow_executions
            WHERE workflow_id = ?
            ORDER BY completed_at DESC
            "#,
    )
    .bind(workflow_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(records)
  }
}
