//! Loop node placeholder.
//!
//! Iteration is not supported by the traversal; the node passes the payload
//! through so graphs that contain one still run end to end.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::types::{NodeContext, NodeExecutor};
use crate::error::Result;
use crate::workflow::Node;

pub struct LoopNode;

impl LoopNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoopNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for LoopNode {
    fn node_type(&self) -> &str {
        "loop"
    }

    fn description(&self) -> &str {
        "Placeholder for iteration; passes the payload through unchanged"
    }

    async fn execute(&self, node: &Node, payload: &Value, _ctx: &NodeContext) -> Result<Value> {
        debug!(node_id = %node.id, "Loop node is a passthrough");
        Ok(payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::NodeKind;
    use serde_json::json;

    #[tokio::test]
    async fn test_loop_passthrough() {
        let node = Node::new("l", NodeKind::Action, "loop").with_config(json!({"times": 3}));
        let ctx = NodeContext::new("exec-1", "wf");
        let payload = json!({"items": [1, 2, 3]});

        let result = LoopNode::new().execute(&node, &payload, &ctx).await.unwrap();
        assert_eq!(result, payload);
    }
}
