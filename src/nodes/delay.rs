//! Delay node - pause execution for a number of milliseconds.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::path::as_f64;
use super::types::{NodeContext, NodeExecutor};
use crate::error::{Error, Result};
use crate::workflow::Node;

/// Used when `delay` is unset, non-numeric, or not positive.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Cap at 1 hour to prevent accidental long waits.
const MAX_DELAY_MS: u64 = 60 * 60 * 1000;

/// Delay node that pauses execution and passes the payload through.
pub struct DelayNode;

impl DelayNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DelayNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for DelayNode {
    fn node_type(&self) -> &str {
        "delay"
    }

    fn description(&self) -> &str {
        "Pause execution for `delay` milliseconds (default 1000)"
    }

    async fn execute(&self, node: &Node, payload: &Value, ctx: &NodeContext) -> Result<Value> {
        let delay_ms = delay_duration_ms(&node.config())?;

        info!(
            execution_id = %ctx.execution_id,
            node_id = %node.id,
            "Delay node pausing for {}ms",
            delay_ms
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        Ok(payload.clone())
    }
}

/// Resolve the wait in milliseconds from node config.
fn delay_duration_ms(config: &Value) -> Result<u64> {
    let requested = config.get("delay").and_then(as_f64);

    let delay_ms = match requested {
        Some(ms) if ms.is_finite() && ms > 0.0 => ms.ceil() as u64,
        _ => DEFAULT_DELAY_MS,
    };

    if delay_ms > MAX_DELAY_MS {
        return Err(Error::Executor(format!(
            "Delay {}ms exceeds maximum of {}ms (1 hour)",
            delay_ms, MAX_DELAY_MS
        )));
    }

    Ok(delay_ms)
}
