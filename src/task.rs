//! Task data model: identifiers, priorities, execution modes, the task
//! status state machine, and the immutable submission/result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::agents::AgentRole;
use crate::error::Error;

/// Unique identifier for a submitted task.
///
/// Uses UUID v4 for generation and provides a short form display
/// for human-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new unique task identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Task priority. Feeds directly into risk assessment: `critical`
/// priority forces `critical` risk regardless of content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            other => Err(Error::Validation(format!("Unknown priority: {}", other))),
        }
    }
}

/// How many cooperating agents run and how tightly a human supervises
/// them.
///
/// `Auto` is a resolution-time sentinel: the orchestrator replaces it with
/// the scorer's recommendation before execution, and it never appears on a
/// final `TaskResult`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    SingleAgent,
    MicroSwarm,
    FullSwarm,
    HumanLed,
    Auto,
}

impl ExecutionMode {
    /// Swarm modes run multiple cooperating roles under a coordinator.
    pub fn is_swarm(&self) -> bool {
        matches!(self, ExecutionMode::MicroSwarm | ExecutionMode::FullSwarm)
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::SingleAgent => write!(f, "single_agent"),
            ExecutionMode::MicroSwarm => write!(f, "micro_swarm"),
            ExecutionMode::FullSwarm => write!(f, "full_swarm"),
            ExecutionMode::HumanLed => write!(f, "human_led"),
            ExecutionMode::Auto => write!(f, "auto"),
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "single_agent" => Ok(ExecutionMode::SingleAgent),
            "micro_swarm" => Ok(ExecutionMode::MicroSwarm),
            "full_swarm" => Ok(ExecutionMode::FullSwarm),
            "human_led" => Ok(ExecutionMode::HumanLed),
            "auto" => Ok(ExecutionMode::Auto),
            other => Err(Error::Validation(format!(
                "Unknown execution mode: {}",
                other
            ))),
        }
    }
}

/// Task status in its lifecycle.
///
/// The main line is `Pending -> Analyzing -> Executing ->
/// {Completed | Failed}`. The approval sub-states are transient and only
/// reachable from `Executing`; they loop back into `Executing` once
/// resolved. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Analyzing,
    Executing,
    AwaitingApproval,
    Approved,
    Rejected,
    Escalated,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Check whether a transition to `target` is allowed from this state.
    ///
    /// Any non-terminal state may fail; everything else follows the
    /// pipeline ordering.
    pub fn can_transition(self, target: TaskStatus) -> bool {
        if target == TaskStatus::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (TaskStatus::Pending, TaskStatus::Analyzing)
                | (TaskStatus::Analyzing, TaskStatus::Executing)
                | (TaskStatus::Executing, TaskStatus::AwaitingApproval)
                | (TaskStatus::Executing, TaskStatus::Completed)
                | (TaskStatus::AwaitingApproval, TaskStatus::Approved)
                | (TaskStatus::AwaitingApproval, TaskStatus::Rejected)
                | (TaskStatus::AwaitingApproval, TaskStatus::Escalated)
                | (TaskStatus::Approved, TaskStatus::Executing)
                | (TaskStatus::Rejected, TaskStatus::Executing)
                | (TaskStatus::Escalated, TaskStatus::Executing)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Analyzing => write!(f, "analyzing"),
            TaskStatus::Executing => write!(f, "executing"),
            TaskStatus::AwaitingApproval => write!(f, "awaiting_approval"),
            TaskStatus::Approved => write!(f, "approved"),
            TaskStatus::Rejected => write!(f, "rejected"),
            TaskStatus::Escalated => write!(f, "escalated"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A task submitted for resolution. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Build a task from a submission spec, applying defaults for
    /// everything the caller left out.
    pub(crate) fn from_spec(spec: TaskSpec) -> Self {
        Self {
            id: TaskId::new(),
            task_type: spec.task_type.unwrap_or_else(|| "general".to_string()),
            title: spec.title.unwrap_or_else(|| "Untitled Task".to_string()),
            description: spec.description.unwrap_or_default(),
            priority: spec.priority.unwrap_or_default(),
            metadata: spec.metadata,
            created_at: Utc::now(),
        }
    }

    /// The raw execution-mode override from metadata, if the submitter
    /// named one. Parsed (strictly) during mode resolution.
    pub fn mode_override(&self) -> Option<&str> {
        self.metadata.get("mode").and_then(Value::as_str)
    }
}

/// Caller-supplied task data for `Orchestrator::submit`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl TaskSpec {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Request a specific execution mode instead of the scorer's
    /// recommendation. The string is validated during the pipeline, so an
    /// unknown mode fails the task rather than the submission.
    pub fn mode(mut self, mode: &str) -> Self {
        self.metadata
            .insert("mode".to_string(), Value::String(mode.to_string()));
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Immutable result of a finished task, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub mode: ExecutionMode,
    pub summary: String,
    pub confidence: f64,
    pub agents_used: Vec<AgentRole>,
    pub resolution_steps: Vec<String>,
    pub execution_time_ms: u64,
    pub cost_usd: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub completed_at: DateTime<Utc>,
}

/// A finding produced while resolving a task, accumulated on the task's
/// internal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFinding {
    pub agent_role: AgentRole,
    pub finding_type: String,
    pub confidence: f64,
    pub summary: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}
