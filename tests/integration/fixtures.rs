//! Shared fixtures for the integration suite.

use std::sync::Arc;

use tether::harness::{ApprovalHandler, HumanApprovalRequest};
use tether::{Orchestrator, Result, SimulatedExecutor, TaskSpec, TetherConfig};

/// Orchestrator with default configuration and the simulated executor.
pub fn orchestrator() -> Orchestrator {
    Orchestrator::new(TetherConfig::default()).expect("default config is valid")
}

/// Orchestrator whose approval handler approves everything.
pub fn approving_orchestrator() -> Orchestrator {
    Orchestrator::with_parts(
        TetherConfig::default(),
        Arc::new(SimulatedExecutor),
        Some(Arc::new(ApproveAll)),
    )
    .expect("default config is valid")
}

/// Orchestrator whose approval handler rejects everything.
pub fn rejecting_orchestrator() -> Orchestrator {
    Orchestrator::with_parts(
        TetherConfig::default(),
        Arc::new(SimulatedExecutor),
        Some(Arc::new(RejectAll)),
    )
    .expect("default config is valid")
}

/// A simple support-ticket style task with no domain keywords.
pub fn simple_task() -> TaskSpec {
    TaskSpec::new("Password reset request").description("User forgot their password")
}

/// A multi-domain incident that the scorer sends to a swarm.
pub fn incident_task() -> TaskSpec {
    TaskSpec::new("API returning 502 errors with database timeouts").description(
        "Users reporting intermittent 502 errors. Logs show database connection timeouts.",
    )
}

pub struct ApproveAll;

impl ApprovalHandler for ApproveAll {
    fn handle(&self, _request: &HumanApprovalRequest) -> Result<bool> {
        Ok(true)
    }
}

pub struct RejectAll;

impl ApprovalHandler for RejectAll {
    fn handle(&self, _request: &HumanApprovalRequest) -> Result<bool> {
        Ok(false)
    }
}
