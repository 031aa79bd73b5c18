//! Execution history storage.

mod memory;
mod models;

use async_trait::async_trait;

pub use memory::{MemoryStore, DEFAULT_HISTORY_CAPACITY};
pub use models::*;

use crate::error::Result;

/// Where the engine keeps execution records.
///
/// `save_execution` is an upsert keyed by record id; the engine calls it
/// repeatedly while an execution runs.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn save_execution(&self, record: &ExecutionRecord) -> Result<()>;

    async fn get_execution(&self, id: &str) -> Result<Option<ExecutionRecord>>;

    /// Records for one workflow, oldest first.
    async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>>;
}
