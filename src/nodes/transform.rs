//! Transform node - ordered field operations over the payload.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::path::{get_path_mut, object_or_empty, set_path_value, stringify_value};
use super::types::{NodeContext, NodeExecutor};
use crate::error::{Error, Result};
use crate::workflow::Node;

/// Transform node implementation.
pub struct TransformNode;

impl TransformNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct TransformConfig {
    #[serde(default)]
    transforms: Vec<FieldTransform>,
}

#[derive(Debug, Deserialize)]
struct FieldTransform {
    field: String,
    operation: Operation,
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Operation {
    Set,
    Append,
    Uppercase,
    Lowercase,
}

#[async_trait]
impl NodeExecutor for TransformNode {
    fn node_type(&self) -> &str {
        "transform"
    }

    fn description(&self) -> &str {
        "Apply set/append/uppercase/lowercase transforms to payload fields"
    }

    async fn execute(&self, node: &Node, payload: &Value, _ctx: &NodeContext) -> Result<Value> {
        let config: TransformConfig = serde_json::from_value(node.config())
            .map_err(|e| Error::Executor(format!("Invalid transform config: {}", e)))?;

        let mut output = object_or_empty(payload);
        for transform in &config.transforms {
            if transform.field.trim().is_empty() {
                return Err(Error::Executor(
                    "Transform field name cannot be empty".to_string(),
                ));
            }
            apply(&mut output, transform)?;
        }

        debug!(
            node_id = %node.id,
            transforms = config.transforms.len(),
            "Transform applied"
        );
        Ok(Value::Object(output))
    }
}

fn apply(output: &mut Map<String, Value>, transform: &FieldTransform) -> Result<()> {
    let field = transform.field.as_str();
    match transform.operation {
        Operation::Set => set_path_value(output, field, transform.value.clone())?,
        Operation::Append => {
            let appended = match get_path_mut(output, field) {
                Some(Value::Array(items)) => {
                    items.push(transform.value.clone());
                    true
                }
                Some(Value::String(s)) => {
                    s.push_str(&stringify_value(&transform.value));
                    true
                }
                Some(existing) if !existing.is_null() => {
                    let joined = stringify_value(existing) + &stringify_value(&transform.value);
                    *existing = Value::String(joined);
                    true
                }
                _ => false,
            };
            if !appended {
                set_path_value(
                    output,
                    field,
                    Value::String(stringify_value(&transform.value)),
                )?;
            }
        }
        Operation::Uppercase | Operation::Lowercase => {
            if let Some(Value::String(s)) = get_path_mut(output, field) {
                *s = match transform.operation {
                    Operation::Uppercase => s.to_uppercase(),
                    _ => s.to_lowercase(),
                };
            }
        }
    }
    Ok(())
}
