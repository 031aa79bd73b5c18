//! Notification node - simulated email/SMS/push delivery.

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

/// Send notification node implementation.
pub struct NotificationNode;

impl NotificationNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NotificationNode {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationConfig {
    #[serde(default = "default_channel")]
    channel: String,
    #[serde(default)]
    recipient: String,
    #[serde(default)]
    message: String,
    #[serde(default = "default_latency_ms")]
    latency_ms: u64,
}

fn default_channel() -> String {
    "email".to_string()
}

fn default_latency_ms() -> u64 {
    300
}

#[async_trait]
impl NodeExecutor for NotificationNode {
    fn node_type(&self) -> &str {
        "send-notification"
    }

    fn description(&self) -> &str {
        "Notify a recipient by channel (simulated; recorded in notifications)"
    }

    async fn execute(&self, node: &Node, payload: &Value, ctx: &NodeContext) -> Result<Value> {
        let config: NotificationConfig = serde_json::from_value(node.config())
            .map_err(|e| Error::Executor(format!("Invalid send-notification config: {}", e)))?;

        let recipient = render_template(&config.recipient, payload);
        let message = render_template(&config.message, payload);
        tokio::time::sleep(Duration::from_millis(config.latency_ms)).await;

        let notification_id = Uuid::new_v4().to_string();
        info!(
            execution_id = %ctx.execution_id,
            channel = %config.channel,
            recipient = %recipient,
            "Notification sent"
        );

        let mut output = object_or_empty(payload);
        push_to_array(
            &mut output,
            "notifications",
            json!({
                "channel": config.channel,
                "recipient": recipient,
                "message": message,
                "notificationId": notification_id,
                "sentAt": Utc::now().to_rfc3339(),
            }),
        );
        Ok(Value::Object(output))
    }
}
