//! Node executors.
//!
//! Each node type in a workflow graph is run by an executor registered under
//! its type name. Executors take the current payload and return the payload
//! handed to the next node.

mod condition;
mod delay;
mod http;
mod loop_node;
mod notification;
pub mod path;
mod registry;
mod social;
mod transform;
mod trigger;
mod types;

pub use condition::{Condition, ConditionNode, Operator};
pub use delay::{DelayNode, DEFAULT_DELAY_MS};
pub use http::HttpRequestNode;
pub use loop_node::LoopNode;
pub use notification::NotificationNode;
pub use registry::ExecutorRegistry;
pub use social::SocialPostNode;
pub use transform::TransformNode;
pub use trigger::{ScheduleTriggerNode, WebhookTriggerNode};
pub use types::{NodeContext, NodeExecutor};
