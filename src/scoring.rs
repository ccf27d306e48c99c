//! Deterministic complexity scoring for mode selection.
//!
//! Scoring is a pure function over the task's title, description, and
//! priority: keyword-based domain detection, a risk ladder, and fixed
//! score bands mapping to execution modes. No state, no learning. The
//! same task text always produces the same assessment.

use serde::{Deserialize, Serialize};

use crate::task::{ExecutionMode, Priority, Task};

/// Domain name -> keywords that mark it as involved. A domain counts as
/// detected when any keyword appears as a substring of the lowercased
/// title+description.
const DOMAIN_KEYWORDS: &[(&str, &[&str])] = &[
    ("logs", &["log", "error", "trace", "debug"]),
    ("code", &["code", "function", "bug", "syntax", "deploy"]),
    ("database", &["database", "query", "sql", "table", "schema"]),
    (
        "infrastructure",
        &["server", "network", "cloud", "kubernetes", "docker"],
    ),
    ("security", &["security", "vulnerability", "auth", "permission"]),
    ("api", &["api", "endpoint", "rest", "graphql", "502", "404"]),
    (
        "performance",
        &["slow", "latency", "throughput", "memory", "cpu"],
    ),
];

/// Keywords that force the risk level to `high` regardless of domains.
const HIGH_RISK_KEYWORDS: &[&str] = &["production", "critical", "security", "data loss"];

/// Risk level attached to a task or an individual action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Complexity assessment produced once per task, immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplexityScore {
    /// Overall score in 1..=10.
    pub overall_score: u8,
    pub domain_count: usize,
    pub estimated_agents_needed: usize,
    pub risk_level: RiskLevel,
    pub recommended_mode: ExecutionMode,
    /// Human-readable explanation naming the detected domains and risk.
    /// Observability only; nothing parses this.
    pub reasoning: String,
}

/// Score a task's complexity and recommend an execution mode.
pub fn analyze(task: &Task) -> ComplexityScore {
    let text = format!("{} {}", task.title, task.description).to_lowercase();

    let domains: Vec<&str> = DOMAIN_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(domain, _)| *domain)
        .collect();
    let domain_count = domains.len().max(1);

    let risk_level = if task.priority == Priority::Critical {
        RiskLevel::Critical
    } else if HIGH_RISK_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        RiskLevel::High
    } else if domain_count > 2 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let risk_bump = if risk_level.is_elevated() { 3 } else { 0 };
    let overall_score = (domain_count * 2 + risk_bump).min(10) as u8;

    let (recommended_mode, estimated_agents_needed) = match overall_score {
        0..=3 => (ExecutionMode::SingleAgent, 1),
        4..=6 => (ExecutionMode::MicroSwarm, (domain_count + 1).min(3)),
        7..=8 => (ExecutionMode::FullSwarm, (domain_count + 2).min(8)),
        _ => (ExecutionMode::HumanLed, domain_count + 2),
    };

    let detected = if domains.is_empty() {
        "general".to_string()
    } else {
        domains.join(", ")
    };

    ComplexityScore {
        overall_score,
        domain_count,
        estimated_agents_needed,
        risk_level,
        recommended_mode,
        reasoning: format!(
            "Detected {} domains ({}). Risk: {}.",
            domain_count, detected, risk_level
        ),
    }
}
