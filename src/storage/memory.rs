//! In-memory execution history.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::models::ExecutionRecord;
use super::ExecutionStore;
use crate::error::Result;

/// Default number of executions kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Bounded history: once full, saving a new execution evicts the oldest.
pub struct MemoryStore {
    capacity: usize,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    /// Execution ids, oldest first
    order: VecDeque<String>,
    records: HashMap<String, ExecutionRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionStore for MemoryStore {
    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner
            .records
            .insert(record.id.clone(), record.clone())
            .is_none()
        {
            inner.order.push_back(record.id.clone());
            while inner.order.len() > self.capacity {
                if let Some(evicted) = inner.order.pop_front() {
                    inner.records.remove(&evicted);
                    debug!(execution_id = %evicted, "Evicted execution from history");
                }
            }
        }
        Ok(())
    }

    async fn get_execution(&self, id: &str) -> Result<Option<ExecutionRecord>> {
        Ok(self.inner.lock().await.records.get(id).cloned())
    }

    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|r| r.workflow_id == workflow_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ExecutionStatus;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_and_get_upserts() {
        let store = MemoryStore::new();
        let mut record = ExecutionRecord::new("wf-1");
        store.save_execution(&record).await.unwrap();

        record.complete(json!({"done": true}));
        store.save_execution(&record).await.unwrap();

        let fetched = store.get_execution(&record.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ExecutionStatus::Completed);
        assert_eq!(store.len().await, 1);
        assert!(store.get_execution("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_workflow_in_start_order() {
        let store = MemoryStore::new();
        let first = ExecutionRecord::new("wf-1");
        let other = ExecutionRecord::new("wf-2");
        let second = ExecutionRecord::new("wf-1");
        for record in [&first, &other, &second] {
            store.save_execution(record).await.unwrap();
        }

        let listed = store.list_executions("wf-1").await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
        assert!(store.list_executions("wf-3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_oldest_evicted_at_capacity() {
        let store = MemoryStore::with_capacity(2);
        let records: Vec<ExecutionRecord> =
            (0..3).map(|_| ExecutionRecord::new("wf-1")).collect();
        for record in &records {
            store.save_execution(record).await.unwrap();
        }

        assert_eq!(store.len().await, 2);
        assert!(store.get_execution(&records[0].id).await.unwrap().is_none());
        assert!(store.get_execution(&records[2].id).await.unwrap().is_some());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        assert_eq!(MemoryStore::with_capacity(0).capacity(), 1);
    }
}
