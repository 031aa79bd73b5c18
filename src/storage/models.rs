//! Execution record and log models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Phase of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogPhase {
    Started,
    Completed,
    Failed,
}

impl std::fmt::Display for LogPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Started => write!(f, "started"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One event in an execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    /// `None` for graph-level failures recorded before any node ran
    pub node_id: Option<String>,
    pub node_label: String,
    pub phase: LogPhase,
    pub message: String,
    /// Payload snapshot, on `completed` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LogEntry {
    pub fn started(node_id: &str, node_label: &str, message: String) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: Some(node_id.to_string()),
            node_label: node_label.to_string(),
            phase: LogPhase::Started,
            message,
            data: None,
            error: None,
        }
    }

    pub fn completed(node_id: &str, node_label: &str, message: String, data: Value) -> Self {
        Self {
            phase: LogPhase::Completed,
            data: Some(data),
            ..Self::started(node_id, node_label, message)
        }
    }

    pub fn failed(node_id: &str, node_label: &str, error: String) -> Self {
        Self {
            phase: LogPhase::Failed,
            message: format!("Node '{}' failed", node_label),
            error: Some(error),
            ..Self::started(node_id, node_label, String::new())
        }
    }

    /// Synthetic entry for a workflow that failed before any node ran.
    pub fn workflow_failed(error: String) -> Self {
        Self {
            timestamp: Utc::now(),
            node_id: None,
            node_label: "workflow".to_string(),
            phase: LogPhase::Failed,
            message: "Workflow validation failed".to_string(),
            data: None,
            error: Some(error),
        }
    }
}

/// Execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub workflow_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub current_node_id: Option<String>,
    pub log: Vec<LogEntry>,
    pub final_payload: Option<Value>,
    pub error: Option<String>,
}

impl ExecutionRecord {
    /// New running record with a fresh id.
    pub fn new(workflow_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            current_node_id: None,
            log: Vec::new(),
            final_payload: None,
            error: None,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.log.push(entry);
    }

    pub fn complete(&mut self, payload: Value) {
        self.status = ExecutionStatus::Completed;
        self.final_payload = Some(payload);
        self.current_node_id = None;
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: String) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error);
        self.current_node_id = None;
        self.completed_at = Some(Utc::now());
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Entries that close a node visit (`completed` or `failed`).
    pub fn outcomes(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter().filter(|e| e.phase != LogPhase::Started)
    }

    /// Number of entries with the given phase.
    pub fn count_phase(&self, phase: LogPhase) -> usize {
        self.log.iter().filter(|e| e.phase == phase).count()
    }

    /// Node id of the last `failed` entry, if any.
    pub fn failed_node(&self) -> Option<&str> {
        self.log
            .iter()
            .rev()
            .find(|e| e.phase == LogPhase::Failed)
            .and_then(|e| e.node_id.as_deref())
    }

    /// Node ids in the order they were started.
    pub fn visited(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter(|e| e.phase == LogPhase::Started)
            .filter_map(|e| e.node_id.as_deref())
            .collect()
    }

    /// Wall-clock duration once terminal.
    pub fn duration_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
