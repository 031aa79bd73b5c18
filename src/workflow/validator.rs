//! Workflow graph validation.

use std::collections::{HashMap, HashSet};

use super::types::{Branch, NodeKind, WorkflowGraph};
use crate::error::{Error, Result};

/// Outcome of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    /// ID of the unique trigger node (the entry point)
    pub trigger_id: String,
    /// Non-fatal findings worth logging
    pub warnings: Vec<String>,
}

/// Validate a workflow graph for sequential traversal.
///
/// Fails with [`Error::Graph`] on:
/// - zero or several trigger nodes
/// - empty or duplicate node IDs
/// - a non-condition node with more than one outgoing edge
/// - a condition node with two edges on the same branch label
///
/// Dangling edges and labels that can never be followed are only warnings.
pub fn validate_graph(graph: &WorkflowGraph) -> Result<ValidationReport> {
    let triggers = graph.trigger_nodes();
    let trigger_id = match triggers.as_slice() {
        [only] => only.id.clone(),
        [] => {
            return Err(Error::Graph(
                "Workflow has no trigger node; exactly one is required".into(),
            ))
        }
        many => {
            let ids: Vec<&str> = many.iter().map(|n| n.id.as_str()).collect();
            return Err(Error::Graph(format!(
                "Workflow has {} trigger nodes ({}); exactly one is required",
                many.len(),
                ids.join(", ")
            )));
        }
    };

    let mut ids = HashSet::new();
    for node in &graph.nodes {
        if node.id.is_empty() {
            return Err(Error::Graph("Node ID cannot be empty".into()));
        }
        if !ids.insert(node.id.as_str()) {
            return Err(Error::Graph(format!("Duplicate node ID: {}", node.id)));
        }
    }

    let kinds: HashMap<&str, NodeKind> = graph
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.kind))
        .collect();

    let mut warnings = Vec::new();
    let mut out_degree: HashMap<&str, usize> = HashMap::new();
    let mut branch_seen: HashSet<(&str, Branch)> = HashSet::new();

    for edge in &graph.edges {
        let Some(kind) = kinds.get(edge.source.as_str()) else {
            warnings.push(format!(
                "Edge {} -> {} starts at unknown node '{}' and is never followed",
                edge.source, edge.target, edge.source
            ));
            continue;
        };

        if !ids.contains(edge.target.as_str()) {
            warnings.push(format!(
                "Edge {} -> {} points at unknown node '{}'; traversal ends there",
                edge.source, edge.target, edge.target
            ));
        }

        if *kind == NodeKind::Condition {
            match edge.branch {
                Some(branch) => {
                    if !branch_seen.insert((edge.source.as_str(), branch)) {
                        return Err(Error::Graph(format!(
                            "Condition node '{}' has more than one '{}' edge",
                            edge.source, branch
                        )));
                    }
                }
                None => warnings.push(format!(
                    "Edge {} -> {} leaves a condition without a true/false label and is never followed",
                    edge.source, edge.target
                )),
            }
        } else {
            let count = out_degree.entry(edge.source.as_str()).or_insert(0);
            *count += 1;
            if *count > 1 {
                return Err(Error::Graph(format!(
                    "Node '{}' has more than one outgoing edge; only condition nodes may branch",
                    edge.source
                )));
            }
            if edge.branch.is_some() {
                warnings.push(format!(
                    "Edge {} -> {} has a branch label but '{}' is not a condition; label ignored",
                    edge.source, edge.target, edge.source
                ));
            }
        }
    }

    Ok(ValidationReport {
        trigger_id,
        warnings,
    })
}
