//! Executor registry - maps node type names to executors.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::types::NodeExecutor;
use super::{
    ConditionNode, DelayNode, HttpRequestNode, LoopNode, NotificationNode, ScheduleTriggerNode,
    SocialPostNode, TransformNode, WebhookTriggerNode,
};
use crate::config::HttpSettings;

/// Registry of available node executors.
#[derive(Clone)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn NodeExecutor>>,
}

impl ExecutorRegistry {
    /// Create a new registry with the built-in executors.
    pub fn new() -> Self {
        Self::with_builtins(&HttpSettings::default())
    }

    /// Built-in executors, with the HTTP client configured from `http`.
    pub fn with_builtins(http: &HttpSettings) -> Self {
        let mut registry = Self::empty();

        registry.register_default(Arc::new(WebhookTriggerNode::new()));
        registry.register_default(Arc::new(ScheduleTriggerNode::new()));
        registry.register_default(Arc::new(DelayNode::new()));
        registry.register_default(Arc::new(HttpRequestNode::with_settings(http)));
        registry.register_default(Arc::new(ConditionNode::new()));
        registry.register_default(Arc::new(TransformNode::new()));
        registry.register_default(Arc::new(LoopNode::new()));
        registry.register_default(Arc::new(SocialPostNode::new()));
        registry.register_default(Arc::new(NotificationNode::new()));

        registry
    }

    /// Create an empty registry (for testing).
    pub fn empty() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under `node_type`.
    ///
    /// Returns the executor previously registered under that name, if any.
    pub fn register(
        &mut self,
        node_type: &str,
        executor: Arc<dyn NodeExecutor>,
    ) -> Option<Arc<dyn NodeExecutor>> {
        let previous = self.executors.insert(node_type.to_string(), executor);
        if previous.is_some() {
            debug!(node_type = %node_type, "Replaced registered executor");
        }
        previous
    }

    /// Register an executor under its own [`NodeExecutor::node_type`].
    pub fn register_default(
        &mut self,
        executor: Arc<dyn NodeExecutor>,
    ) -> Option<Arc<dyn NodeExecutor>> {
        let node_type = executor.node_type().to_string();
        self.register(&node_type, executor)
    }

    /// Get the executor for a node type.
    pub fn resolve(&self, node_type: &str) -> Option<Arc<dyn NodeExecutor>> {
        self.executors.get(node_type).cloned()
    }

    /// Check if a node type is registered.
    pub fn has(&self, node_type: &str) -> bool {
        self.executors.contains_key(node_type)
    }

    /// List all registered node types, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.executors.keys().map(|s| s.as_str()).collect();
        types.sort_unstable();
        types
    }

    /// Get descriptions of all registered executors, sorted by type.
    pub fn descriptions(&self) -> Vec<(&str, &str)> {
        let mut descriptions: Vec<(&str, &str)> = self
            .executors
            .iter()
            .map(|(name, executor)| (name.as_str(), executor.description()))
            .collect();
        descriptions.sort_unstable_by_key(|(name, _)| *name);
        descriptions
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::nodes::NodeContext;
    use crate::workflow::{Node, NodeKind};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct TaggingNode(&'static str);

    #[async_trait]
    impl NodeExecutor for TaggingNode {
        fn node_type(&self) -> &str {
            "delay"
        }

        async fn execute(&self, _node: &Node, payload: &Value, _ctx: &NodeContext) -> Result<Value> {
            let mut output = payload.clone();
            output["tag"] = json!(self.0);
            Ok(output)
        }
    }

    #[test]
    fn test_registry_default_executors() {
        let registry = ExecutorRegistry::new();

        for node_type in [
            "webhook-trigger",
            "schedule-trigger",
            "delay",
            "http-request",
            "condition",
            "transform",
            "loop",
            "social-post",
            "send-notification",
        ] {
            assert!(registry.has(node_type), "missing {}", node_type);
        }
        assert!(!registry.has("nonexistent"));
        assert_eq!(registry.list().len(), 9);
    }

    #[test]
    fn test_list_is_sorted() {
        let registry = ExecutorRegistry::new();
        let types = registry.list();
        let mut sorted = types.clone();
        sorted.sort();
        assert_eq!(types, sorted);
        assert_eq!(registry.descriptions().len(), types.len());
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = ExecutorRegistry::empty();
        assert!(registry.register("custom", Arc::new(TaggingNode("first"))).is_none());
        assert!(registry.register("custom", Arc::new(TaggingNode("second"))).is_some());

        let executor = registry.resolve("custom").unwrap();
        let node = Node::new("n", NodeKind::Action, "custom");
        let ctx = NodeContext::new("exec-1", "wf");
        let result = executor.execute(&node, &json!({}), &ctx).await.unwrap();
        assert_eq!(result["tag"], "second");
    }

    #[test]
    fn test_register_default_uses_node_type() {
        let mut registry = ExecutorRegistry::empty();
        registry.register_default(Arc::new(TaggingNode("x")));
        assert!(registry.has("delay"));
        assert!(registry.resolve("custom").is_none());
    }
}
