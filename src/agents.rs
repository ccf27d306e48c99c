//! Specialized agent roles and the deterministic role assigner.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::Error;
use crate::scoring::ComplexityScore;

/// The closed set of agent roles the harness knows how to supervise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    LogAnalyst,
    CodeSpecialist,
    DatabaseExpert,
    InfrastructureOps,
    SecurityAnalyst,
    ApiSpecialist,
    PerformanceEngineer,
    DocumentationWriter,
    CommunicationManager,
    SwarmCoordinator,
}

impl AgentRole {
    /// All roles, in declaration order. Used by the CLI listing.
    pub const ALL: [AgentRole; 10] = [
        AgentRole::LogAnalyst,
        AgentRole::CodeSpecialist,
        AgentRole::DatabaseExpert,
        AgentRole::InfrastructureOps,
        AgentRole::SecurityAnalyst,
        AgentRole::ApiSpecialist,
        AgentRole::PerformanceEngineer,
        AgentRole::DocumentationWriter,
        AgentRole::CommunicationManager,
        AgentRole::SwarmCoordinator,
    ];
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentRole::LogAnalyst => write!(f, "log_analyst"),
            AgentRole::CodeSpecialist => write!(f, "code_specialist"),
            AgentRole::DatabaseExpert => write!(f, "database_expert"),
            AgentRole::InfrastructureOps => write!(f, "infrastructure_ops"),
            AgentRole::SecurityAnalyst => write!(f, "security_analyst"),
            AgentRole::ApiSpecialist => write!(f, "api_specialist"),
            AgentRole::PerformanceEngineer => write!(f, "performance_engineer"),
            AgentRole::DocumentationWriter => write!(f, "documentation_writer"),
            AgentRole::CommunicationManager => write!(f, "communication_manager"),
            AgentRole::SwarmCoordinator => write!(f, "swarm_coordinator"),
        }
    }
}

impl std::str::FromStr for AgentRole {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "log_analyst" => Ok(AgentRole::LogAnalyst),
            "code_specialist" => Ok(AgentRole::CodeSpecialist),
            "database_expert" => Ok(AgentRole::DatabaseExpert),
            "infrastructure_ops" => Ok(AgentRole::InfrastructureOps),
            "security_analyst" => Ok(AgentRole::SecurityAnalyst),
            "api_specialist" => Ok(AgentRole::ApiSpecialist),
            "performance_engineer" => Ok(AgentRole::PerformanceEngineer),
            "documentation_writer" => Ok(AgentRole::DocumentationWriter),
            "communication_manager" => Ok(AgentRole::CommunicationManager),
            "swarm_coordinator" => Ok(AgentRole::SwarmCoordinator),
            other => Err(Error::Validation(format!("Unknown agent role: {}", other))),
        }
    }
}

/// Assign agent roles for a scored task.
///
/// The baseline analyst always leads. Swarm modes get their coordinator
/// next, so truncation never drops it. Specialists follow in fixed
/// priority order (api, then infrastructure, then code) as the estimated
/// agent count grows, and the list is capped at
/// `estimated_agents_needed` entries, dropping the lowest-priority
/// specialists first.
pub fn assign_agents(score: &ComplexityScore) -> Vec<AgentRole> {
    let mut roles = vec![AgentRole::LogAnalyst];
    if score.recommended_mode.is_swarm() {
        roles.push(AgentRole::SwarmCoordinator);
    }
    if score.estimated_agents_needed > 1 {
        roles.push(AgentRole::ApiSpecialist);
    }
    if score.estimated_agents_needed > 2 {
        roles.push(AgentRole::InfrastructureOps);
    }
    if score.estimated_agents_needed > 3 {
        roles.push(AgentRole::CodeSpecialist);
    }

    let mut seen = HashSet::new();
    roles.retain(|role| seen.insert(*role));
    roles.truncate(score.estimated_agents_needed.max(1));
    roles
}
