//! Task lifecycle orchestration.
//!
//! The orchestrator owns the task table and drives each submitted task
//! through the pipeline: analyze complexity, resolve the execution mode,
//! open a harness context, assign agent roles, execute through the
//! injected [`AgentExecutor`], and assemble the result. Pipelines for
//! different tasks run as independent units of concurrent work; a failure
//! in one never touches another.

use chrono::Utc;
use serde_json::Map;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};

use crate::agents::{assign_agents, AgentRole};
use crate::config::TetherConfig;
use crate::error::{Error, Result};
use crate::executor::{AgentExecutor, SimulatedExecutor};
use crate::harness::{ApprovalHandler, AuditEntry, Harness, HarnessConfig};
use crate::scoring::{analyze, ComplexityScore};
use crate::task::{
    AgentFinding, ExecutionMode, Task, TaskId, TaskResult, TaskSpec, TaskStatus,
};
use crate::{tlog, tlog_error};

/// Internal mutable state for a task being processed. Owned by the
/// orchestrator; mutated only by the task's own pipeline.
#[derive(Debug, Clone)]
pub struct TaskState {
    pub task: Task,
    pub status: TaskStatus,
    pub mode: ExecutionMode,
    pub complexity: Option<ComplexityScore>,
    pub assigned_roles: Vec<AgentRole>,
    pub findings: Vec<AgentFinding>,
    pub result: Option<TaskResult>,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl TaskState {
    fn new(task: Task) -> Self {
        let now = Utc::now();
        Self {
            task,
            status: TaskStatus::Pending,
            mode: ExecutionMode::Auto,
            complexity: None,
            assigned_roles: Vec::new(),
            findings: Vec::new(),
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Transition to a new status, rejecting moves the state machine
    /// does not allow.
    pub fn set_status(&mut self, target: TaskStatus) -> Result<()> {
        if !self.status.can_transition(target) {
            return Err(Error::InvalidStatusTransition {
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }
}

type TaskTable = Arc<RwLock<HashMap<TaskId, TaskState>>>;
type SignalTable = Arc<RwLock<HashMap<TaskId, watch::Sender<bool>>>>;

/// Coordinates task pipelines and exposes the caller-facing API:
/// `submit`, `await_result`, `get_status`.
pub struct Orchestrator {
    harness: Arc<Harness>,
    executor: Arc<dyn AgentExecutor>,
    tasks: TaskTable,
    signals: SignalTable,
}

impl Orchestrator {
    /// Build an orchestrator with the default simulated executor and no
    /// approval handler.
    pub fn new(config: TetherConfig) -> Result<Self> {
        Self::with_parts(config, Arc::new(SimulatedExecutor), None)
    }

    pub fn with_executor(config: TetherConfig, executor: Arc<dyn AgentExecutor>) -> Result<Self> {
        Self::with_parts(config, executor, None)
    }

    pub fn with_parts(
        config: TetherConfig,
        executor: Arc<dyn AgentExecutor>,
        approval_handler: Option<Arc<dyn ApprovalHandler>>,
    ) -> Result<Self> {
        config.validate()?;
        let harness_config = HarnessConfig::from(&config);
        let harness = match approval_handler {
            Some(handler) => Harness::with_approval_handler(harness_config, handler),
            None => Harness::new(harness_config),
        };
        Ok(Self {
            harness: Arc::new(harness),
            executor,
            tasks: Arc::new(RwLock::new(HashMap::new())),
            signals: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Audit entries, optionally filtered to one task.
    pub fn audit_log(&self, task_id: Option<&TaskId>) -> Vec<AuditEntry> {
        self.harness.audit_log().query(task_id)
    }

    /// Submit a task for processing. Never blocks on the pipeline: the
    /// task starts in the background and the immutable `Task` is returned
    /// immediately.
    pub async fn submit(&self, spec: TaskSpec) -> Task {
        let task = Task::from_spec(spec);
        let task_id = task.id;
        let (tx, _rx) = watch::channel(false);

        self.tasks.write().await.insert(task_id, TaskState::new(task.clone()));
        self.signals.write().await.insert(task_id, tx);
        tlog!(
            "task_submitted id={} type={} priority={}",
            task_id.short(),
            task.task_type,
            task.priority
        );

        let harness = Arc::clone(&self.harness);
        let executor = Arc::clone(&self.executor);
        let tasks = Arc::clone(&self.tasks);
        let signals = Arc::clone(&self.signals);
        tokio::spawn(async move {
            Self::run_pipeline(harness, executor, tasks, signals, task_id).await;
        });

        task
    }

    /// Block until the task completes (successfully or not) and return
    /// its result.
    ///
    /// Fails with `TaskNotFound` for unknown ids and `Timeout` when the
    /// deadline passes. A timeout abandons only the wait; the pipeline
    /// keeps running and a later call can still retrieve the result.
    pub async fn await_result(
        &self,
        task_id: TaskId,
        timeout: Option<Duration>,
    ) -> Result<TaskResult> {
        let mut rx = {
            let signals = self.signals.read().await;
            signals
                .get(&task_id)
                .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?
                .subscribe()
        };

        let already_done = *rx.borrow();
        if !already_done {
            let changed = rx.changed();
            match timeout {
                Some(limit) => tokio::time::timeout(limit, changed)
                    .await
                    .map_err(|_| Error::Timeout(limit))?
                    .map_err(|_| Error::Internal("completion channel closed".to_string()))?,
                None => changed
                    .await
                    .map_err(|_| Error::Internal("completion channel closed".to_string()))?,
            }
        }

        let tasks = self.tasks.read().await;
        let state = tasks
            .get(&task_id)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
        state.result.clone().ok_or_else(|| {
            Error::Internal(format!(
                "task {} signalled completion without a result",
                task_id
            ))
        })
    }

    /// Current status of a task.
    pub async fn get_status(&self, task_id: TaskId) -> Result<TaskStatus> {
        let tasks = self.tasks.read().await;
        tasks
            .get(&task_id)
            .map(|state| state.status)
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    /// Snapshot of a task's internal state, including complexity score,
    /// assigned roles, and findings.
    pub async fn get_state(&self, task_id: TaskId) -> Result<TaskState> {
        let tasks = self.tasks.read().await;
        tasks
            .get(&task_id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))
    }

    /// Run one task's pipeline to a terminal status, then tear down its
    /// context and fire the completion signal. The result is durably in
    /// the task table before the signal fires.
    async fn run_pipeline(
        harness: Arc<Harness>,
        executor: Arc<dyn AgentExecutor>,
        tasks: TaskTable,
        signals: SignalTable,
        task_id: TaskId,
    ) {
        let started = Instant::now();
        let driven = Self::drive(&harness, executor, &tasks, task_id, started).await;

        if let Err(e) = driven {
            tlog_error!("task_failed id={} error={}", task_id.short(), e);
            let mut table = tasks.write().await;
            if let Some(state) = table.get_mut(&task_id) {
                // Auto must not leak onto a final result even when the
                // failure predates mode resolution.
                let mode = if state.mode == ExecutionMode::Auto {
                    ExecutionMode::SingleAgent
                } else {
                    state.mode
                };
                state.result = Some(TaskResult {
                    task_id,
                    status: TaskStatus::Failed,
                    mode,
                    summary: format!("Task failed: {}", e),
                    confidence: 0.0,
                    agents_used: state.assigned_roles.clone(),
                    resolution_steps: Vec::new(),
                    execution_time_ms: started.elapsed().as_millis() as u64,
                    cost_usd: 0.0,
                    metadata: Map::new(),
                    completed_at: Utc::now(),
                });
                if state.set_status(TaskStatus::Failed).is_err() {
                    // Every non-terminal state may fail; reaching this
                    // means the pipeline ran on a terminal task.
                    state.status = TaskStatus::Failed;
                }
            }
        }

        harness.cleanup_context(&task_id);
        if let Some(tx) = signals.read().await.get(&task_id) {
            // send_replace stores the value even with no live receivers,
            // so a waiter subscribing after completion still observes it.
            tx.send_replace(true);
        }
    }

    async fn drive(
        harness: &Arc<Harness>,
        executor: Arc<dyn AgentExecutor>,
        tasks: &TaskTable,
        task_id: TaskId,
        started: Instant,
    ) -> Result<()> {
        // Analyze
        let (task, score) = {
            let mut table = tasks.write().await;
            let state = table
                .get_mut(&task_id)
                .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
            state.set_status(TaskStatus::Analyzing)?;
            let score = analyze(&state.task);
            state.complexity = Some(score.clone());
            (state.task.clone(), score)
        };

        // Resolve mode: explicit metadata override wins, strictly parsed.
        let explicit = task
            .mode_override()
            .map(ExecutionMode::from_str)
            .transpose()?;
        let mode = resolve_mode(explicit, score.recommended_mode);
        tlog!(
            "mode_selected task={} mode={} complexity={}",
            task_id.short(),
            mode,
            score.overall_score
        );

        // Open the harness context and assign roles.
        harness.create_context(task_id, mode)?;
        let roles = assign_agents(&score);
        harness.set_active_roles(&task_id, &roles)?;
        {
            let mut table = tasks.write().await;
            let state = table
                .get_mut(&task_id)
                .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
            state.mode = mode;
            state.assigned_roles = roles.clone();
            state.set_status(TaskStatus::Executing)?;
        }
        tlog!(
            "agents_assigned task={} agents={}",
            task_id.short(),
            roles
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );

        // Execute via the injected collaborator.
        let outcome = executor.execute(&task, mode, &roles, harness).await?;

        // Complete
        let execution_time_ms = started.elapsed().as_millis() as u64;
        {
            let mut table = tasks.write().await;
            let state = table
                .get_mut(&task_id)
                .ok_or_else(|| Error::TaskNotFound(task_id.to_string()))?;
            state.findings.push(AgentFinding {
                agent_role: roles.first().copied().unwrap_or(AgentRole::LogAnalyst),
                finding_type: "resolution".to_string(),
                confidence: outcome.confidence,
                summary: outcome.summary.clone(),
                evidence: outcome.steps.clone(),
                recommended_actions: Vec::new(),
                recorded_at: Utc::now(),
            });
            state.result = Some(TaskResult {
                task_id,
                status: TaskStatus::Completed,
                mode,
                summary: outcome.summary,
                confidence: outcome.confidence,
                agents_used: roles,
                resolution_steps: outcome.steps,
                execution_time_ms,
                cost_usd: outcome.cost_usd,
                metadata: outcome.metadata,
                completed_at: Utc::now(),
            });
            state.set_status(TaskStatus::Completed)?;
        }
        tlog!(
            "task_completed id={} time_ms={}",
            task_id.short(),
            execution_time_ms
        );
        Ok(())
    }
}

/// Resolve the effective execution mode. The `auto` sentinel falls back
/// to the scorer's recommendation and must never reach execution.
fn resolve_mode(explicit: Option<ExecutionMode>, recommended: ExecutionMode) -> ExecutionMode {
    let mode = match explicit {
        Some(ExecutionMode::Auto) | None => recommended,
        Some(mode) => mode,
    };
    if mode == ExecutionMode::Auto {
        ExecutionMode::SingleAgent
    } else {
        mode
    }
}
