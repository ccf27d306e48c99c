//! The agent-execution seam.
//!
//! The orchestrator does not reason about tasks itself; it hands the task,
//! the selected mode, and the assigned roles to an [`AgentExecutor`]. The
//! contract is that every discrete action the executor wants to perform is
//! gated through the harness before it counts as taken, and reported via
//! `record_action` once executed.
//!
//! [`SimulatedExecutor`] is the built-in implementation: deterministic
//! canned outcomes per mode, useful for the CLI, tests, and wiring checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::agents::AgentRole;
use crate::error::Result;
use crate::harness::{Harness, HarnessAction};
use crate::task::{ExecutionMode, Task};

/// Structured outcome returned by an executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub summary: String,
    /// Confidence in 0..=100.
    pub confidence: f64,
    pub steps: Vec<String>,
    pub cost_usd: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// External capability that resolves a task given its assigned roles.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &Task,
        mode: ExecutionMode,
        roles: &[AgentRole],
        harness: &Harness,
    ) -> Result<AgentOutcome>;
}

/// Deterministic stand-in for real agent reasoning.
///
/// Produces a fixed playbook per execution mode and runs each resolution
/// step through the gate; steps the gate withholds are counted in the
/// outcome metadata instead of being recorded as taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    fn playbook(mode: ExecutionMode, title: &str) -> (String, f64, Vec<String>, f64, Duration) {
        match mode {
            ExecutionMode::MicroSwarm => (
                format!("Resolved '{}' with coordinated micro-swarm.", title),
                88.0,
                vec![
                    "Swarm coordinator dispatched agents".to_string(),
                    "Parallel investigation across domains".to_string(),
                    "Findings consolidated".to_string(),
                    "Resolution implemented".to_string(),
                ],
                0.025,
                Duration::from_millis(200),
            ),
            ExecutionMode::FullSwarm => (
                format!("Complex resolution for '{}' via full swarm.", title),
                85.0,
                vec![
                    "Complexity analyzed across domains".to_string(),
                    "Full swarm activated".to_string(),
                    "Multi-domain investigation".to_string(),
                    "Dispute resolution completed".to_string(),
                    "Comprehensive resolution plan".to_string(),
                ],
                0.15,
                Duration::from_millis(500),
            ),
            ExecutionMode::HumanLed => (
                format!("Human-led resolution for '{}'.", title),
                95.0,
                vec![
                    "Task escalated to human operator".to_string(),
                    "Agents provided supporting analysis".to_string(),
                    "Human made final decision".to_string(),
                ],
                0.05,
                Duration::from_millis(100),
            ),
            // Auto never reaches execution; treat it like a single agent.
            ExecutionMode::SingleAgent | ExecutionMode::Auto => (
                format!("Investigated '{}' using single agent mode.", title),
                92.0,
                vec![
                    "Analyzed task".to_string(),
                    "Investigated root cause".to_string(),
                    "Provided resolution".to_string(),
                ],
                0.008,
                Duration::from_millis(100),
            ),
        }
    }
}

#[async_trait]
impl AgentExecutor for SimulatedExecutor {
    async fn execute(
        &self,
        task: &Task,
        mode: ExecutionMode,
        roles: &[AgentRole],
        harness: &Harness,
    ) -> Result<AgentOutcome> {
        let (summary, confidence, steps, cost_usd, delay) = Self::playbook(mode, &task.title);
        tokio::time::sleep(delay).await;

        let lead = roles.first().copied().unwrap_or(AgentRole::LogAnalyst);
        let mut taken = 0u32;
        let mut held = 0u32;
        for step in &steps {
            let action = HarnessAction::new(lead, "resolution_step", step.clone(), confidence);
            let decision = harness.gate_action(&task.id, &action)?;
            if decision.approved {
                harness.record_action(&task.id, &action, step)?;
                taken += 1;
            } else {
                held += 1;
            }
        }

        let mut metadata = Map::new();
        metadata.insert("mode".to_string(), json!(mode.to_string()));
        metadata.insert("agents".to_string(), json!(roles.len()));
        metadata.insert("actions_taken".to_string(), json!(taken));
        if held > 0 {
            metadata.insert("actions_held".to_string(), json!(held));
        }

        Ok(AgentOutcome {
            summary,
            confidence,
            steps,
            cost_usd,
            metadata,
        })
    }
}
