//! Condition node - branch predicate evaluated by the engine.
//!
//! The executor itself only passes the payload through (after checking the
//! config parses). Branch selection needs the outgoing edges, so the engine
//! calls [`Condition::evaluate`] after the node completes.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::path::{as_f64, get_path_value, stringify_value};
use super::types::{NodeContext, NodeExecutor};
use crate::error::{Error, Result};
use crate::workflow::Node;

/// Comparison operator of a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
    /// Evaluates to `true` (fail-open)
    Unknown(String),
}

impl Operator {
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "equals" | "eq" | "==" => Self::Equals,
            "not_equals" | "ne" | "!=" => Self::NotEquals,
            "contains" => Self::Contains,
            "greater_than" | "gt" | ">" => Self::GreaterThan,
            "less_than" | "lt" | "<" => Self::LessThan,
            "exists" => Self::Exists,
            _ => Self::Unknown(name.to_string()),
        }
    }
}

/// A `{field, operator, value}` predicate over the payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    /// Dotted path into the payload
    pub field: String,
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

fn default_operator() -> String {
    "equals".to_string()
}

impl Condition {
    /// Read the condition from a node.
    ///
    /// Accepts the keys inline in the config or under a `condition` object.
    pub fn from_node(node: &Node) -> Result<Self> {
        let config = node.config();
        let source = match config.get("condition") {
            Some(nested @ Value::Object(_)) => nested.clone(),
            _ => config,
        };
        let condition: Condition = serde_json::from_value(source).map_err(|e| {
            Error::Executor(format!("Invalid condition config on '{}': {}", node.id, e))
        })?;
        if condition.field.trim().is_empty() {
            return Err(Error::Executor(format!(
                "Condition on '{}' requires a non-empty field",
                node.id
            )));
        }
        Ok(condition)
    }

    /// Evaluate against the payload.
    pub fn evaluate(&self, payload: &Value) -> bool {
        let left = get_path_value(payload, self.field.trim());
        evaluate_operator(&Operator::parse(&self.operator), left, &self.value)
    }
}

fn evaluate_operator(operator: &Operator, left: Option<&Value>, right: &Value) -> bool {
    match operator {
        Operator::Equals => left.is_some_and(|l| values_equal(l, right)),
        Operator::NotEquals => !left.is_some_and(|l| values_equal(l, right)),
        Operator::Contains => left
            .map(|l| stringify_value(l).contains(&stringify_value(right)))
            .unwrap_or(false),
        Operator::GreaterThan | Operator::LessThan => {
            let (Some(l), Some(r)) = (left.and_then(as_f64), as_f64(right)) else {
                return false;
            };
            if *operator == Operator::GreaterThan {
                l > r
            } else {
                l < r
            }
        }
        Operator::Exists => left.is_some_and(|l| !l.is_null()),
        Operator::Unknown(name) => {
            warn!("Unknown condition operator '{}', treating as true", name);
            true
        }
    }
}

/// JSON equality, except that numbers compare by value (`5.0 == 5`).
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.as_f64() == r.as_f64(),
        _ => left == right,
    }
}

/// Condition node implementation.
pub struct ConditionNode;

impl ConditionNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConditionNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeExecutor for ConditionNode {
    fn node_type(&self) -> &str {
        "condition"
    }

    fn description(&self) -> &str {
        "Branch on {field, operator, value}; follows the true or false edge"
    }

    async fn execute(&self, node: &Node, payload: &Value, _ctx: &NodeContext) -> Result<Value> {
        Condition::from_node(node)?;
        Ok(payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::NodeKind;
    use serde_json::json;

    fn condition(field: &str, operator: &str, value: Value) -> Condition {
        Condition {
            field: field.to_string(),
            operator: operator.to_string(),
            value,
        }
    }

    #[test]
    fn test_equals_is_strict() {
        let c = condition("x", "equals", json!(5));
        assert!(c.evaluate(&json!({"x": 5})));
        assert!(!c.evaluate(&json!({"x": 4})));
        assert!(!c.evaluate(&json!({"x": "5"})));
        assert!(!c.evaluate(&json!({})));
    }

    #[test]
    fn test_equals_compares_numbers_by_value() {
        let float_payload: Value = serde_json::from_str(r#"{"x": 5.0}"#).unwrap();
        assert!(condition("x", "equals", json!(5)).evaluate(&float_payload));
        assert!(!condition("x", "not_equals", json!(5)).evaluate(&float_payload));
        assert!(condition("x", "equals", json!(5.0)).evaluate(&json!({"x": 5})));
        assert!(!condition("x", "equals", json!(5)).evaluate(&json!({"x": 5.5})));
    }

    #[test]
    fn test_not_equals_negates() {
        let c = condition("x", "not_equals", json!(5));
        assert!(!c.evaluate(&json!({"x": 5})));
        assert!(c.evaluate(&json!({"x": 4})));
        assert!(c.evaluate(&json!({})));
    }

    #[test]
    fn test_contains_coerces_to_string() {
        let c = condition("bio", "contains", json!("link"));
        assert!(c.evaluate(&json!({"bio": "my link page"})));
        assert!(!c.evaluate(&json!({"bio": "nothing"})));
        assert!(condition("code", "contains", json!(23)).evaluate(&json!({"code": 1234})));
        assert!(!c.evaluate(&json!({})));
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt = condition("score", "greater_than", json!(50));
        assert!(gt.evaluate(&json!({"score": 80})));
        assert!(gt.evaluate(&json!({"score": "51"})));
        assert!(!gt.evaluate(&json!({"score": 50})));
        assert!(!gt.evaluate(&json!({"score": "high"})));
        assert!(!gt.evaluate(&json!({})));

        let lt = condition("score", "less_than", json!("10"));
        assert!(lt.evaluate(&json!({"score": 3})));
        assert!(!lt.evaluate(&json!({"score": 30})));
    }

    #[test]
    fn test_exists() {
        let c = condition("user.email", "exists", Value::Null);
        assert!(c.evaluate(&json!({"user": {"email": "a@b.c"}})));
        assert!(!c.evaluate(&json!({"user": {"email": null}})));
        assert!(!c.evaluate(&json!({"user": {}})));
    }

    #[test]
    fn test_unknown_operator_fails_open() {
        let c = condition("x", "matches_vibe", json!(1));
        assert!(c.evaluate(&json!({})));
    }

    #[test]
    fn test_from_node_inline_and_nested() {
        let inline = Node::new("c", NodeKind::Condition, "condition")
            .with_config(json!({"field": "score", "operator": "greater_than", "value": 50}));
        assert_eq!(Condition::from_node(&inline).unwrap().field, "score");

        let nested = Node::new("c", NodeKind::Condition, "condition")
            .with_config(json!({"condition": {"field": "tier", "value": "pro"}}));
        let parsed = Condition::from_node(&nested).unwrap();
        assert_eq!(parsed.operator, "equals");
        assert!(parsed.evaluate(&json!({"tier": "pro"})));
    }

    #[tokio::test]
    async fn test_condition_node_rejects_missing_field() {
        let node = Node::new("c", NodeKind::Condition, "condition");
        let ctx = NodeContext::new("exec-1", "wf");
        let err = ConditionNode::new()
            .execute(&node, &json!({}), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid condition config"));
    }
}
