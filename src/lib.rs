//! linkflow - workflow execution engine for bio-link automations
//!
//! linkflow walks a directed graph of typed nodes (triggers, actions,
//! conditions) from its single trigger, runs each node's executor in
//! sequence, branches on condition nodes, and records a structured
//! execution log.
//!
//! ## Example
//!
//! ```yaml
//! nodes:
//!   - id: hook
//!     kind: trigger
//!     type: webhook-trigger
//!   - id: check
//!     kind: condition
//!     type: condition
//!     data:
//!       field: score
//!       operator: greater_than
//!       value: 50
//!   - id: notify
//!     kind: action
//!     type: send-notification
//!     data:
//!       config:
//!         recipient: "{{ email }}"
//!         message: "You scored {{ score }}"
//!
//! edges:
//!   - source: hook
//!     target: check
//!   - source: check
//!     target: notify
//!     branch: true
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod nodes;
pub mod storage;
pub mod workflow;

pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};
