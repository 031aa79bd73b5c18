//! Social post node.
//!
//! Publishing is simulated: the node waits `latencyMs` and records the post
//! on `payload.socialPosts`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::path::{object_or_empty, push_to_array, render_template};
use super::types::{NodeContext, NodeExecutor};
use crate::error::{Error, Result};
use crate::workflow::Node;

pub struct SocialPostNode;

impl SocialPostNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SocialPostNode {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialPostConfig {
    #[serde(default = "default_platform")]
    platform: String,
    #[serde(default)]
    content: String,
    #[serde(default = "default_latency_ms")]
    latency_ms: u64,
}

fn default_platform() -> String {
    "tiktok".to_string()
}

fn default_latency_ms() -> u64 {
    500
}

#[async_trait]
impl NodeExecutor for SocialPostNode {
    fn node_type(&self) -> &str {
        "social-post"
    }

    fn description(&self) -> &str {
        "Publish content to a social platform (simulated; recorded in socialPosts)"
    }

    async fn execute(&self, node: &Node, payload: &Value, ctx: &NodeContext) -> Result<Value> {
        let config: SocialPostConfig = serde_json::from_value(node.config())
            .map_err(|e| Error::Executor(format!("Invalid social-post config: {}", e)))?;

        let content = render_template(&config.content, payload);
        tokio::time::sleep(Duration::from_millis(config.latency_ms)).await;

        let post_id = format!("{}_{}", config.platform, Uuid::new_v4().simple());
        info!(
            execution_id = %ctx.execution_id,
            platform = %config.platform,
            post_id = %post_id,
            "Social post published"
        );

        let mut output = object_or_empty(payload);
        push_to_array(
            &mut output,
            "socialPosts",
            json!({
                "platform": config.platform,
                "postId": post_id,
                "content": content,
                "postedAt": Utc::now().to_rfc3339(),
            }),
        );
        Ok(Value::Object(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::NodeKind;

    fn post_node(config: Value) -> Node {
        Node::new("post", NodeKind::Action, "social-post").with_config(config)
    }

    #[tokio::test]
    async fn test_post_recorded_with_defaults() {
        let node = post_node(json!({"content": "New link for {{ handle }}", "latencyMs": 0}));
        let ctx = NodeContext::new("exec-1", "wf");

        let result = SocialPostNode::new()
            .execute(&node, &json!({"handle": "ana"}), &ctx)
            .await
            .unwrap();

        let posts = result["socialPosts"].as_array().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["platform"], "tiktok");
        assert_eq!(posts[0]["content"], "New link for ana");
        assert!(posts[0]["postId"].as_str().unwrap().starts_with("tiktok_"));
        assert_eq!(result["handle"], "ana");
    }

    #[tokio::test]
    async fn test_posts_accumulate() {
        let node = post_node(json!({"platform": "instagram", "latencyMs": 0}));
        let ctx = NodeContext::new("exec-1", "wf");
        let payload = json!({"socialPosts": [{"platform": "tiktok"}]});

        let result = SocialPostNode::new()
            .execute(&node, &payload, &ctx)
            .await
            .unwrap();

        let posts = result["socialPosts"].as_array().unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1]["platform"], "instagram");
    }
}
