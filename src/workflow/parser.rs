//! Workflow graph parser (JSON or YAML).

use std::path::Path;

use super::types::WorkflowGraph;
use crate::error::{Error, Result};

/// Parse a workflow graph from a string.
///
/// Input starting with `{` is read as JSON, anything else as YAML.
pub fn parse_graph(source: &str) -> Result<WorkflowGraph> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(Error::Parse("Empty workflow definition".to_string()));
    }

    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).map_err(|e| describe_error("JSON", &e.to_string()))
    } else {
        serde_yaml::from_str(trimmed).map_err(|e| describe_error("YAML", &e.to_string()))
    }
}

/// Parse a workflow graph from a file path.
pub fn parse_graph_file(path: &Path) -> Result<WorkflowGraph> {
    let content = std::fs::read_to_string(path)?;
    parse_graph(&content)
}

fn describe_error(format: &str, msg: &str) -> Error {
    if let Some(field) = extract_missing_field(msg) {
        Error::Parse(format!("Missing required field: {}", field))
    } else {
        Error::Parse(format!("Invalid {}: {}", format, msg))
    }
}

fn extract_missing_field(error_message: &str) -> Option<&str> {
    let marker = "missing field `";
    let start = error_message.find(marker)? + marker.len();
    let rest = &error_message[start..];
    let end = rest.find('`')?;
    Some(&rest[..end])
}
