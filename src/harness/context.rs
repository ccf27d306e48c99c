//! Per-task execution context owned by the harness.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::agents::AgentRole;
use crate::harness::action::ActionId;
use crate::harness::approval::ApprovalId;
use crate::task::{ExecutionMode, TaskId};

/// One executed action, as remembered by its context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action_id: ActionId,
    pub kind: String,
    pub agent_role: AgentRole,
    pub confidence: f64,
    pub executed_at: DateTime<Utc>,
    /// Result summary, capped at 500 characters. Empty when result
    /// logging is disabled.
    pub result_summary: String,
}

/// Mutable bookkeeping for one active task. Created when the pipeline
/// opens the task and destroyed at teardown; only the audit log outlives
/// it.
#[derive(Debug, Clone)]
pub struct HarnessContext {
    pub task_id: TaskId,
    pub mode: ExecutionMode,
    pub active_roles: Vec<AgentRole>,
    /// Total executed actions for this task. Advanced only by
    /// `Harness::record_action`.
    pub tool_calls: u32,
    pub actions_taken: Vec<ActionRecord>,
    pub pending_approvals: Vec<ApprovalId>,
    pub started_at: DateTime<Utc>,
    /// Execution timestamps inside the rolling rate window.
    recent_executions: VecDeque<DateTime<Utc>>,
}

impl HarnessContext {
    pub(crate) fn new(task_id: TaskId, mode: ExecutionMode) -> Self {
        Self {
            task_id,
            mode,
            active_roles: Vec::new(),
            tool_calls: 0,
            actions_taken: Vec::new(),
            pending_approvals: Vec::new(),
            started_at: Utc::now(),
            recent_executions: VecDeque::new(),
        }
    }

    /// Wall-clock time since the context was opened.
    pub fn elapsed(&self) -> Duration {
        Utc::now() - self.started_at
    }

    pub(crate) fn note_execution(&mut self, at: DateTime<Utc>) {
        self.recent_executions.push_back(at);
    }

    /// Count executions within `window` before `now`, pruning anything
    /// older.
    pub(crate) fn executions_in_window(&mut self, now: DateTime<Utc>, window: Duration) -> usize {
        let cutoff = now - window;
        while self
            .recent_executions
            .front()
            .is_some_and(|at| *at < cutoff)
        {
            self.recent_executions.pop_front();
        }
        self.recent_executions.len()
    }
}
