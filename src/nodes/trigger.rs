//! Trigger nodes - workflow entry points.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::path::object_or_empty;
use super::types::{NodeContext, NodeExecutor};
use crate::error::{Error, Result};
use crate::workflow::Node;

/// Webhook trigger: the request body is the initial payload.
pub struct WebhookTriggerNode;

impl WebhookTriggerNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebhookTriggerNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for WebhookTriggerNode {
    fn node_type(&self) -> &str {
        "webhook-trigger"
    }

    fn description(&self) -> &str {
        "Start a workflow from an incoming webhook (payload passes through)"
    }

    async fn execute(&self, _node: &Node, payload: &Value, _ctx: &NodeContext) -> Result<Value> {
        Ok(payload.clone())
    }
}

/// Scheduled trigger: stamps the firing time and schedule onto the payload.
pub struct ScheduleTriggerNode;

impl ScheduleTriggerNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScheduleTriggerNode {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ScheduleConfig {
    /// Cron-style expression, echoed as-is
    #[serde(default, alias = "cron")]
    schedule: Option<String>,
}

#[async_trait]
impl NodeExecutor for ScheduleTriggerNode {
    fn node_type(&self) -> &str {
        "schedule-trigger"
    }

    fn description(&self) -> &str {
        "Start a workflow on a schedule (adds triggeredAt and schedule)"
    }

    async fn execute(&self, node: &Node, payload: &Value, ctx: &NodeContext) -> Result<Value> {
        let config: ScheduleConfig = serde_json::from_value(node.config())
            .map_err(|e| Error::Executor(format!("Invalid schedule-trigger config: {}", e)))?;

        let mut output = object_or_empty(payload);
        output.insert(
            "triggeredAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        if let Some(schedule) = config.schedule {
            debug!(
                execution_id = %ctx.execution_id,
                schedule = %schedule,
                "Schedule trigger fired"
            );
            output.insert("schedule".to_string(), Value::String(schedule));
        }

        Ok(Value::Object(output))
    }
}
