//! Traversal controller.
//!
//! Walks a workflow graph one node at a time from its trigger, following the
//! single outgoing edge of each node or, for condition nodes, the edge whose
//! branch label matches the evaluated predicate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn, Span};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::nodes::{Condition, ExecutorRegistry, NodeContext, NodeExecutor};
use crate::storage::{ExecutionRecord, ExecutionStore, LogEntry, MemoryStore};
use crate::workflow::{validate_graph, Branch, Node, NodeKind, WorkflowGraph};

/// Workflow engine.
///
/// One engine can run many executions concurrently; each execution owns its
/// record and payload.
pub struct Engine {
    registry: ExecutorRegistry,
    store: Arc<dyn ExecutionStore>,
    node_timeout: Option<Duration>,
}

/// Result of running one node.
enum StepOutcome {
    Completed { payload: Value, message: String },
    Failed(String),
}

impl Engine {
    /// Create an engine with an in-memory history of default size.
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self {
            registry,
            store: Arc::new(MemoryStore::new()),
            node_timeout: None,
        }
    }

    /// Built-in executors, history size and node timeout taken from config.
    pub fn from_config(config: &Config) -> Self {
        let mut engine = Self::new(ExecutorRegistry::with_builtins(&config.http)).with_store(
            Arc::new(MemoryStore::with_capacity(config.engine.history_capacity)),
        );
        if let Some(ms) = config.engine.node_timeout_ms {
            engine = engine.with_node_timeout(Duration::from_millis(ms));
        }
        engine
    }

    /// Replace the history store.
    pub fn with_store(mut self, store: Arc<dyn ExecutionStore>) -> Self {
        self.store = store;
        self
    }

    /// Fail any node that runs longer than `limit`.
    pub fn with_node_timeout(mut self, limit: Duration) -> Self {
        self.node_timeout = Some(limit);
        self
    }

    /// Register an executor for `node_type`, replacing any existing one.
    pub fn register_executor(
        &mut self,
        node_type: &str,
        executor: Arc<dyn NodeExecutor>,
    ) -> Option<Arc<dyn NodeExecutor>> {
        self.registry.register(node_type, executor)
    }

    pub fn registry(&self) -> &ExecutorRegistry {
        &self.registry
    }

    /// Get an execution record by id.
    pub async fn get_execution(&self, execution_id: &str) -> Result<Option<ExecutionRecord>> {
        self.store.get_execution(execution_id).await
    }

    /// All retained executions of a workflow, oldest first.
    pub async fn executions_for_workflow(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>> {
        self.store.list_executions(workflow_id).await
    }

    /// Execute a workflow graph.
    ///
    /// Graph and executor failures are reported through the returned record's
    /// `status` and `error`; `Err` means the history store failed.
    #[instrument(
        name = "workflow.execute",
        skip(self, graph, initial_payload),
        fields(
            workflow_id = %workflow_id,
            execution_id = tracing::field::Empty,
        )
    )]
    pub async fn execute(
        &self,
        workflow_id: &str,
        graph: &WorkflowGraph,
        initial_payload: Value,
    ) -> Result<ExecutionRecord> {
        let mut record = ExecutionRecord::new(workflow_id);
        Span::current().record("execution_id", record.id.as_str());
        info!(
            "Starting execution {} of workflow '{}' ({} nodes, {} edges)",
            record.id,
            workflow_id,
            graph.nodes.len(),
            graph.edges.len()
        );
        self.store.save_execution(&record).await?;

        let report = match validate_graph(graph) {
            Ok(report) => report,
            Err(e) => {
                let message = e.message();
                warn!("Workflow '{}' rejected: {}", workflow_id, message);
                record.push(LogEntry::workflow_failed(message.clone()));
                return self.finish_failed(record, message).await;
            }
        };
        for warning in &report.warnings {
            warn!("{}", warning);
        }

        let plan = self.plan(graph);
        let mut payload = initial_payload;
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = graph.get_node(&report.trigger_id);
        let mut step = 0usize;

        while let Some(node) = current {
            if !visited.insert(node.id.as_str()) {
                let message = format!(
                    "Cycle detected: node '{}' was reached a second time",
                    node.id
                );
                error!("{}", message);
                return self.finish_failed(record, message).await;
            }

            record.current_node_id = Some(node.id.clone());
            self.append(
                &mut record,
                LogEntry::started(
                    &node.id,
                    node.label(),
                    format!("Executing {} node '{}'", node.node_type, node.label()),
                ),
            )
            .await?;

            let ctx = NodeContext::new(&record.id, workflow_id).at_step(step);
            let executor = plan.get(node.id.as_str()).cloned().flatten();
            match self.run_node(node, executor, &payload, &ctx).await {
                StepOutcome::Completed {
                    payload: output,
                    message,
                } => {
                    let next = match self.next_node(graph, node, &output) {
                        Ok(next) => next,
                        Err(e) => {
                            let message = e.message();
                            self.append(
                                &mut record,
                                LogEntry::failed(&node.id, node.label(), message.clone()),
                            )
                            .await?;
                            return self.finish_failed(record, message).await;
                        }
                    };
                    self.append(
                        &mut record,
                        LogEntry::completed(&node.id, node.label(), message, output.clone()),
                    )
                    .await?;
                    payload = output;
                    current = next;
                }
                StepOutcome::Failed(message) => {
                    error!(node_id = %node.id, "Node '{}' failed: {}", node.label(), message);
                    self.append(
                        &mut record,
                        LogEntry::failed(&node.id, node.label(), message.clone()),
                    )
                    .await?;
                    return self.finish_failed(record, message).await;
                }
            }
            step += 1;
        }

        record.complete(payload);
        self.store.save_execution(&record).await?;
        info!(
            "Execution {} completed after {} nodes in {}ms",
            record.id,
            step,
            record.duration_ms().unwrap_or_default()
        );
        Ok(record)
    }

    /// Resolve every node's executor once, warning about unknown types.
    fn plan<'g>(&self, graph: &'g WorkflowGraph) -> HashMap<&'g str, Option<Arc<dyn NodeExecutor>>> {
        graph
            .nodes
            .iter()
            .map(|node| {
                let executor = self.registry.resolve(&node.node_type);
                if executor.is_none() {
                    warn!(
                        node_id = %node.id,
                        "No executor registered for node type '{}'; node will be skipped",
                        node.node_type
                    );
                }
                (node.id.as_str(), executor)
            })
            .collect()
    }

    async fn run_node(
        &self,
        node: &Node,
        executor: Option<Arc<dyn NodeExecutor>>,
        payload: &Value,
        ctx: &NodeContext,
    ) -> StepOutcome {
        let Some(executor) = executor else {
            return StepOutcome::Completed {
                payload: payload.clone(),
                message: format!(
                    "Skipped: no executor registered for node type '{}'",
                    node.node_type
                ),
            };
        };

        debug!(node_id = %node.id, step = ctx.step, "Running {} executor", node.node_type);
        let result = match self.node_timeout {
            Some(limit) => tokio::time::timeout(limit, executor.execute(node, payload, ctx))
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Executor(format!(
                        "Node '{}' timed out after {}ms",
                        node.id,
                        limit.as_millis()
                    )))
                }),
            None => executor.execute(node, payload, ctx).await,
        };

        match result {
            Ok(output) => StepOutcome::Completed {
                payload: output,
                message: format!("Node '{}' completed", node.label()),
            },
            Err(e) => StepOutcome::Failed(e.message()),
        }
    }

    /// Pick the successor of `node` given the payload it produced.
    ///
    /// `Ok(None)` ends the traversal normally.
    fn next_node<'g>(
        &self,
        graph: &'g WorkflowGraph,
        node: &Node,
        payload: &Value,
    ) -> Result<Option<&'g Node>> {
        let edge = if node.kind == NodeKind::Condition {
            let condition = Condition::from_node(node)?;
            let branch = Branch::from_bool(condition.evaluate(payload));
            debug!(
                node_id = %node.id,
                field = %condition.field,
                operator = %condition.operator,
                "Condition evaluated to {}",
                branch
            );
            let edge = graph
                .outgoing(&node.id)
                .find(|e| e.branch == Some(branch));
            if edge.is_none() {
                info!(node_id = %node.id, "No '{}' edge; traversal ends", branch);
            }
            edge
        } else {
            graph.outgoing(&node.id).next()
        };

        let Some(edge) = edge else {
            return Ok(None);
        };
        let target = graph.get_node(&edge.target);
        if target.is_none() {
            warn!(
                "Edge {} -> {} points at a missing node; traversal ends",
                edge.source, edge.target
            );
        }
        Ok(target)
    }

    async fn append(&self, record: &mut ExecutionRecord, entry: LogEntry) -> Result<()> {
        record.push(entry);
        self.store.save_execution(record).await
    }

    async fn finish_failed(
        &self,
        mut record: ExecutionRecord,
        message: String,
    ) -> Result<ExecutionRecord> {
        record.fail(message);
        self.store.save_execution(&record).await?;
        info!("Execution {} failed", record.id);
        Ok(record)
    }
}
