//! Workflow graph type definitions.
//!
//! These mirror the JSON the dashboard editor produces: a flat list of nodes
//! and a flat list of directed edges.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A complete workflow graph.
///
/// # Example JSON
///
/// ```json
/// {
///   "nodes": [
///     { "id": "start", "kind": "trigger", "nodeType": "webhook-trigger" },
///     { "id": "wait", "kind": "action", "nodeType": "delay",
///       "data": { "label": "Wait a bit", "delay": 250 } }
///   ],
///   "edges": [
///     { "source": "start", "target": "wait" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    /// Nodes (steps) in the workflow
    pub nodes: Vec<Node>,

    /// Directed connections between nodes
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Structural role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Trigger,
    Action,
    Condition,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trigger => write!(f, "trigger"),
            Self::Action => write!(f, "action"),
            Self::Condition => write!(f, "condition"),
        }
    }
}

/// A node (step) in the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique node ID within this graph
    pub id: String,

    /// Structural role (trigger, action, condition)
    pub kind: NodeKind,

    /// Behavior key used to look up an executor
    #[serde(alias = "type")]
    pub node_type: String,

    /// UI metadata and executor settings, in one bag
    #[serde(default)]
    pub data: NodeData,
}

/// The `data` bag of a node.
///
/// `label` and `description` are display metadata. Everything else is
/// executor configuration, either inline or under a nested `config` object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Create a node with an empty data bag.
    pub fn new(id: &str, kind: NodeKind, node_type: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            node_type: node_type.to_string(),
            data: NodeData::default(),
        }
    }

    /// Set the display label.
    pub fn with_label(mut self, label: &str) -> Self {
        self.data.label = Some(label.to_string());
        self
    }

    /// Set the nested executor config.
    pub fn with_config(mut self, config: Value) -> Self {
        self.data.config = Some(config);
        self
    }

    /// Display label, falling back to the node id.
    pub fn label(&self) -> &str {
        self.data.label.as_deref().unwrap_or(&self.id)
    }

    /// Executor configuration for this node.
    ///
    /// Inline keys of the data bag are overlaid by the nested `config` object.
    pub fn config(&self) -> Value {
        let mut merged = self.data.extra.clone();
        if let Some(Value::Object(nested)) = &self.data.config {
            for (key, value) in nested {
                merged.insert(key.clone(), value.clone());
            }
        }
        Value::Object(merged)
    }
}

/// Branch label on an edge leaving a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    True,
    False,
}

impl Branch {
    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl std::fmt::Display for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::False => write!(f, "false"),
        }
    }
}

/// Directed connection between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub source: String,

    pub target: String,

    /// `true`/`false` label, only meaningful when `source` is a condition.
    /// Editors that emit other handle names produce an unlabeled edge.
    #[serde(
        default,
        alias = "sourceHandle",
        deserialize_with = "deserialize_branch",
        skip_serializing_if = "Option::is_none"
    )]
    pub branch: Option<Branch>,
}

impl Edge {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            id: None,
            source: source.to_string(),
            target: target.to_string(),
            branch: None,
        }
    }

    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branch = Some(branch);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BranchRepr {
    Bool(bool),
    Text(String),
}

fn deserialize_branch<'de, D>(deserializer: D) -> std::result::Result<Option<Branch>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<BranchRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(BranchRepr::Bool(value)) => Some(Branch::from_bool(value)),
        Some(BranchRepr::Text(text)) => match text.trim().to_lowercase().as_str() {
            "true" => Some(Branch::True),
            "false" => Some(Branch::False),
            _ => None,
        },
        None => None,
    })
}

impl WorkflowGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Get a node by ID.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// All nodes whose kind is `trigger`.
    pub fn trigger_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Trigger)
            .collect()
    }

    /// Edges leaving the given node, in declaration order.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// Get all node types used in this graph.
    pub fn node_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.nodes.iter().map(|n| n.node_type.as_str()).collect();
        types.sort();
        types.dedup();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_merges_inline_and_nested() {
        let node: Node = serde_json::from_value(json!({
            "id": "wait",
            "kind": "action",
            "nodeType": "delay",
            "data": {
                "label": "Wait",
                "description": "pause",
                "delay": 10,
                "color": "#fff",
                "config": { "delay": 25 }
            }
        }))
        .unwrap();

        assert_eq!(node.label(), "Wait");
        let config = node.config();
        assert_eq!(config["delay"], 25);
        assert_eq!(config["color"], "#fff");
        assert!(config.get("label").is_none());
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let node = Node::new("n1", NodeKind::Action, "delay");
        assert_eq!(node.label(), "n1");
    }

    #[test]
    fn test_type_alias_and_missing_data() {
        let node: Node = serde_json::from_value(json!({
            "id": "t",
            "kind": "trigger",
            "type": "webhook-trigger"
        }))
        .unwrap();
        assert_eq!(node.node_type, "webhook-trigger");
        assert_eq!(node.config(), json!({}));
    }

    #[test]
    fn test_branch_labels() {
        let edges: Vec<Edge> = serde_json::from_value(json!([
            { "source": "c", "target": "a", "branch": "true" },
            { "source": "c", "target": "b", "sourceHandle": false },
            { "source": "c", "target": "d", "sourceHandle": "default" },
            { "source": "c", "target": "e" }
        ]))
        .unwrap();

        assert_eq!(edges[0].branch, Some(Branch::True));
        assert_eq!(edges[1].branch, Some(Branch::False));
        assert_eq!(edges[2].branch, None);
        assert_eq!(edges[3].branch, None);
    }

    #[test]
    fn test_outgoing_and_triggers() {
        let graph = WorkflowGraph::new(
            vec![
                Node::new("a", NodeKind::Trigger, "webhook-trigger"),
                Node::new("b", NodeKind::Action, "delay"),
            ],
            vec![Edge::new("a", "b")],
        );

        assert_eq!(graph.trigger_nodes().len(), 1);
        assert_eq!(graph.outgoing("a").count(), 1);
        assert_eq!(graph.outgoing("b").count(), 0);
        assert_eq!(graph.node_types(), vec!["delay", "webhook-trigger"]);
    }
}
