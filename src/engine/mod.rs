//! Execution engine for workflow graphs.

mod controller;

pub use controller::Engine;
