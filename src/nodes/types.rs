//! Node executor trait and context types.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::workflow::Node;

/// Context passed to an executor alongside the payload.
#[derive(Debug, Clone)]
pub struct NodeContext {
    /// Execution ID
    pub execution_id: String,

    /// Workflow ID supplied by the caller
    pub workflow_id: String,

    /// Zero-based position of this node in the traversal
    pub step: usize,
}

impl NodeContext {
    /// Create a new context.
    pub fn new(execution_id: &str, workflow_id: &str) -> Self {
        Self {
            execution_id: execution_id.to_string(),
            workflow_id: workflow_id.to_string(),
            step: 0,
        }
    }

    /// Set the traversal step.
    pub fn at_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }
}

/// Trait that all node executors implement.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    /// Get the node type this executor is registered under by default
    /// (e.g., "delay", "http-request").
    fn node_type(&self) -> &str;

    /// Execute the node against the current payload.
    ///
    /// # Arguments
    /// * `node` - Node definition; executors read `node.config()` and never modify it
    /// * `payload` - Payload produced by the previous step
    /// * `ctx` - Execution identifiers
    ///
    /// # Returns
    /// The payload handed to the next node
    async fn execute(&self, node: &Node, payload: &Value, ctx: &NodeContext) -> Result<Value>;

    /// Get a description of this node type.
    fn description(&self) -> &str {
        "A workflow node"
    }
}
