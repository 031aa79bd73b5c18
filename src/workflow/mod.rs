//! Workflow graph definition, parsing, and validation.
//!
//! A workflow is a directed graph of:
//! - Nodes: a trigger (entry point), actions, and conditions
//! - Edges: source/target pairs, labelled `true`/`false` when leaving a condition

mod parser;
mod types;
mod validator;

pub use parser::{parse_graph, parse_graph_file};
pub use types::*;
pub use validator::{validate_graph, ValidationReport};
