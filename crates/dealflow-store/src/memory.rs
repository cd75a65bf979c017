use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{ExecutionRecord, ExecutionStore, StoreError};

/// In-process store. Records are lost when it is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
  records: Mutex<HashMap<String, ExecutionRecord>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, ExecutionRecord>> {
    self.records.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
  async fn complete_execution(&self, record: &ExecutionRecord) -> Result<(), StoreError> {
    self
      .lock()
      .insert(record.execution_id.clone(), record.clone());
    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError> {
    self
      .lock()
      .get(execution_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(execution_id.to_string()))
  }

  async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
    let mut records: Vec<ExecutionRecord> = self
      .lock()
      .values()
      .filter(|r| r.workflow_id.as_deref() == Some(workflow_id))
      .cloned()
      .collect();
    records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(records)
  }
}
