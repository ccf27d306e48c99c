//! The harness: confidence-gated action mediation with calibrated human
//! oversight.
//!
//! Every discrete action an agent wants to take passes through
//! [`Harness::gate_action`] first. The gate classifies the action's
//! confidence into an autonomy band, enforces per-task caps, and either
//! approves, approves-with-review-flag, or routes to the human approval
//! workflow. Executed actions are reported back through
//! [`Harness::record_action`], which is the only thing that advances the
//! per-task counters. Every decision leaves an audit entry.

mod action;
mod approval;
mod audit;
mod context;

pub use action::{ActionId, ConfidenceLevel, HarnessAction};
pub use approval::{ApprovalHandler, ApprovalId, ApprovalRegistry, HumanApprovalRequest};
pub use audit::{AuditEntry, AuditLog};
pub use context::{ActionRecord, HarnessContext};

use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::agents::AgentRole;
use crate::config::{ConfidenceThresholds, TetherConfig};
use crate::error::{Error, Result};
use crate::task::{ExecutionMode, TaskId};
use crate::tlog_debug;

/// Result summaries stored on action records are capped at this many
/// characters.
const MAX_RESULT_SUMMARY_CHARS: usize = 500;

/// Gating subsystem configuration, derived from [`TetherConfig`].
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub thresholds: ConfidenceThresholds,
    pub approval_timeout: Duration,
    /// Declared per-action deadline for executors. Not enforced by the
    /// gate.
    pub action_timeout: Duration,
    pub max_actions_per_minute: u32,
    pub max_tool_calls_per_task: u32,
    pub audit_all_actions: bool,
    pub log_tool_outputs: bool,
}

impl From<&TetherConfig> for HarnessConfig {
    fn from(config: &TetherConfig) -> Self {
        Self {
            thresholds: config.thresholds,
            approval_timeout: Duration::from_secs(config.approval_timeout_secs),
            action_timeout: Duration::from_secs(config.action_timeout_secs),
            max_actions_per_minute: config.max_actions_per_minute,
            max_tool_calls_per_task: config.max_tool_calls_per_task,
            audit_all_actions: config.audit_all_actions,
            log_tool_outputs: config.log_tool_outputs,
        }
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::from(&TetherConfig::default())
    }
}

/// Outcome of gating a single action.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub approved: bool,
    pub reason: String,
    /// Set when the action is blocked on an outstanding approval request.
    pub pending: Option<ApprovalId>,
}

impl GateDecision {
    fn approve(reason: impl Into<String>) -> Self {
        Self {
            approved: true,
            reason: reason.into(),
            pending: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: reason.into(),
            pending: None,
        }
    }

    fn awaiting(id: ApprovalId) -> Self {
        Self {
            approved: false,
            reason: format!("Awaiting approval: {}", id),
            pending: Some(id),
        }
    }
}

/// Internal routing outcome of the locked portion of `gate_action`.
enum Route {
    Decided(GateDecision),
    NeedsHandler(HumanApprovalRequest),
}

/// Central mediation layer for agent actions: contexts, the confidence
/// gate, the approval workflow, and the audit log.
pub struct Harness {
    config: HarnessConfig,
    contexts: RwLock<HashMap<TaskId, HarnessContext>>,
    approvals: ApprovalRegistry,
    audit: AuditLog,
    approval_handler: Option<Arc<dyn ApprovalHandler>>,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            contexts: RwLock::new(HashMap::new()),
            approvals: ApprovalRegistry::new(),
            audit: AuditLog::new(),
            approval_handler: None,
        }
    }

    pub fn with_approval_handler(
        config: HarnessConfig,
        handler: Arc<dyn ApprovalHandler>,
    ) -> Self {
        Self {
            approval_handler: Some(handler),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn approvals(&self) -> &ApprovalRegistry {
        &self.approvals
    }

    /// Open a fresh context for a task. Reusing a task id that already
    /// has an open context is a logic error.
    pub fn create_context(&self, task_id: TaskId, mode: ExecutionMode) -> Result<()> {
        let mut contexts = self.lock_contexts();
        if contexts.contains_key(&task_id) {
            return Err(Error::ContextExists(task_id.to_string()));
        }
        contexts.insert(task_id, HarnessContext::new(task_id, mode));
        drop(contexts);
        self.audit.append(
            AuditEntry::new("context_created")
                .attr("task_id", task_id.to_string())
                .attr("mode", mode.to_string()),
        );
        Ok(())
    }

    /// Snapshot of a task's context, if one is open.
    pub fn get_context(&self, task_id: &TaskId) -> Option<HarnessContext> {
        self.contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(task_id)
            .cloned()
    }

    pub fn set_active_roles(&self, task_id: &TaskId, roles: &[AgentRole]) -> Result<()> {
        let mut contexts = self.lock_contexts();
        let ctx = contexts
            .get_mut(task_id)
            .ok_or_else(|| Error::ContextNotFound(task_id.to_string()))?;
        ctx.active_roles = roles.to_vec();
        Ok(())
    }

    /// Classify a confidence score into its autonomy band.
    pub fn confidence_level(&self, confidence: f64) -> ConfidenceLevel {
        let t = &self.config.thresholds;
        if confidence >= t.auto_execute as f64 {
            ConfidenceLevel::AutoExecute
        } else if confidence >= t.execute_review as f64 {
            ConfidenceLevel::ExecuteReview
        } else if confidence >= t.require_approval as f64 {
            ConfidenceLevel::RequireApproval
        } else {
            ConfidenceLevel::HumanLed
        }
    }

    /// Gate an action before it is taken.
    ///
    /// Evaluation order: per-task tool-call cap, per-minute rate cap,
    /// mode enforcement (human-led always routes to approval), then the
    /// confidence bands. Every invocation writes an `action_gated` audit
    /// entry regardless of outcome.
    pub fn gate_action(&self, task_id: &TaskId, action: &HarnessAction) -> Result<GateDecision> {
        let level = self.confidence_level(action.confidence);
        self.audit.append(
            AuditEntry::new("action_gated")
                .attr("task_id", task_id.to_string())
                .attr("action_id", action.id.to_string())
                .attr("confidence", action.confidence)
                .attr("confidence_level", level.to_string()),
        );

        let route = {
            let mut contexts = self.lock_contexts();
            let ctx = contexts
                .get_mut(task_id)
                .ok_or_else(|| Error::ContextNotFound(task_id.to_string()))?;

            if ctx.tool_calls >= self.config.max_tool_calls_per_task {
                return Ok(GateDecision::deny("Tool call limit exceeded"));
            }
            let window = ChronoDuration::seconds(60);
            if ctx.executions_in_window(Utc::now(), window)
                >= self.config.max_actions_per_minute as usize
            {
                return Ok(GateDecision::deny("Action rate limit exceeded"));
            }

            if ctx.mode == ExecutionMode::HumanLed {
                Route::NeedsHandler(self.file_approval_request(ctx, action))
            } else {
                match level {
                    ConfidenceLevel::AutoExecute => {
                        Route::Decided(GateDecision::approve("Auto-approved (high confidence)"))
                    }
                    ConfidenceLevel::ExecuteReview => {
                        self.audit.append(
                            AuditEntry::new("action_flagged_for_review")
                                .attr("task_id", task_id.to_string())
                                .attr("action_id", action.id.to_string()),
                        );
                        Route::Decided(GateDecision::approve(
                            "Approved with post-execution review",
                        ))
                    }
                    ConfidenceLevel::RequireApproval | ConfidenceLevel::HumanLed => {
                        Route::NeedsHandler(self.file_approval_request(ctx, action))
                    }
                }
            }
        };

        // The handler may block; it runs with no harness lock held.
        match route {
            Route::Decided(decision) => Ok(decision),
            Route::NeedsHandler(request) => Ok(self.resolve_via_handler(request)),
        }
    }

    /// Record an executed action. Must be called exactly once per action
    /// actually taken, never per gate check; this is the only place the
    /// tool-call counter and the rate window advance.
    pub fn record_action(
        &self,
        task_id: &TaskId,
        action: &HarnessAction,
        result_summary: &str,
    ) -> Result<()> {
        let now = Utc::now();
        {
            let mut contexts = self.lock_contexts();
            let ctx = contexts
                .get_mut(task_id)
                .ok_or_else(|| Error::ContextNotFound(task_id.to_string()))?;

            let summary = if self.config.log_tool_outputs {
                result_summary.chars().take(MAX_RESULT_SUMMARY_CHARS).collect()
            } else {
                String::new()
            };
            ctx.actions_taken.push(ActionRecord {
                action_id: action.id,
                kind: action.kind.clone(),
                agent_role: action.agent_role,
                confidence: action.confidence,
                executed_at: now,
                result_summary: summary,
            });
            ctx.tool_calls += 1;
            ctx.note_execution(now);
        }

        if self.config.audit_all_actions {
            self.audit.append(
                AuditEntry::new("action_executed")
                    .attr("task_id", task_id.to_string())
                    .attr("action_id", action.id.to_string())
                    .attr("kind", action.kind.clone()),
            );
        }
        Ok(())
    }

    /// Approve a pending request. Idempotent: returns `false` (and audits
    /// nothing) when the id is unknown or already resolved.
    pub fn approve(&self, id: &ApprovalId) -> bool {
        self.resolve_request(id, true, None)
    }

    /// Reject a pending request, optionally with a reason. Idempotent.
    pub fn reject(&self, id: &ApprovalId, reason: Option<&str>) -> bool {
        self.resolve_request(id, false, reason)
    }

    /// Remove expired approval requests. Expiry is advisory data; nothing
    /// sweeps automatically. Returns the removed requests.
    pub fn sweep_expired_approvals(&self) -> Vec<HumanApprovalRequest> {
        let removed = self.approvals.sweep_expired(Utc::now());
        for request in &removed {
            self.detach_pending(&request.task_id, &request.id);
            self.audit.append(
                AuditEntry::new("approval_expired")
                    .attr("task_id", request.task_id.to_string())
                    .attr("approval_id", request.id.to_string()),
            );
        }
        removed
    }

    /// Tear down a task's context: the context and its pending approval
    /// requests are removed, its audit entries are not.
    pub fn cleanup_context(&self, task_id: &TaskId) {
        let removed = self.lock_contexts().remove(task_id);
        let Some(ctx) = removed else {
            return;
        };
        for id in &ctx.pending_approvals {
            self.approvals.remove(id);
        }
        self.audit.append(
            AuditEntry::new("context_cleaned_up").attr("task_id", task_id.to_string()),
        );
    }

    fn lock_contexts(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<TaskId, HarnessContext>> {
        self.contexts.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an approval request for an action and attach it to the
    /// context. Caller holds the contexts lock.
    fn file_approval_request(
        &self,
        ctx: &mut HarnessContext,
        action: &HarnessAction,
    ) -> HumanApprovalRequest {
        let now = Utc::now();
        let expires_at = now
            + ChronoDuration::seconds(self.config.approval_timeout.as_secs().min(i64::MAX as u64) as i64);
        let request = HumanApprovalRequest {
            id: ApprovalId::new(),
            task_id: ctx.task_id,
            description: action.description.clone(),
            risk_assessment: action.risk_level,
            confidence: action.confidence,
            recommending_roles: vec![action.agent_role],
            created_at: now,
            expires_at,
        };
        self.approvals.insert(request.clone());
        ctx.pending_approvals.push(request.id);
        self.audit.append(
            AuditEntry::new("approval_requested")
                .attr("task_id", ctx.task_id.to_string())
                .attr("approval_id", request.id.to_string())
                .attr("action_id", action.id.to_string()),
        );
        request
    }

    /// Resolve a fresh request through the configured handler, or leave
    /// it pending when none is configured. Handler failures are
    /// rejections, never faults.
    fn resolve_via_handler(&self, request: HumanApprovalRequest) -> GateDecision {
        let Some(handler) = &self.approval_handler else {
            return GateDecision::awaiting(request.id);
        };
        match handler.handle(&request) {
            Ok(true) => {
                self.resolve_request(&request.id, true, None);
                GateDecision::approve("Human approved")
            }
            Ok(false) => {
                self.resolve_request(&request.id, false, Some("rejected by approval handler"));
                GateDecision::deny("Human rejected")
            }
            Err(e) => {
                let reason = e.to_string();
                tlog_debug!("approval handler error: {}", reason);
                self.resolve_request(&request.id, false, Some(&reason));
                GateDecision::deny(format!("Approval handler error: {}", reason))
            }
        }
    }

    fn resolve_request(&self, id: &ApprovalId, approved: bool, reason: Option<&str>) -> bool {
        let Some(request) = self.approvals.remove(id) else {
            return false;
        };
        self.detach_pending(&request.task_id, id);
        let event = if approved {
            "approval_granted"
        } else {
            "approval_rejected"
        };
        let mut entry = AuditEntry::new(event)
            .attr("task_id", request.task_id.to_string())
            .attr("approval_id", id.to_string());
        if let Some(reason) = reason {
            entry = entry.attr("reason", reason);
        }
        self.audit.append(entry);
        true
    }

    /// Drop a resolved request id from its owning context's pending list,
    /// if that context is still alive.
    fn detach_pending(&self, task_id: &TaskId, id: &ApprovalId) {
        let mut contexts = self.lock_contexts();
        if let Some(ctx) = contexts.get_mut(task_id) {
            ctx.pending_approvals.retain(|pending| pending != id);
        }
    }
}
