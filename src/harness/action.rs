//! Action types flowing through the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::agents::AgentRole;
use crate::scoring::RiskLevel;

/// Unique identifier for a gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Autonomy band derived from an action's confidence and the configured
/// thresholds. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// Run unattended.
    AutoExecute,
    /// Run now, flag for post-hoc review.
    ExecuteReview,
    /// Block until a human approves.
    RequireApproval,
    /// Below every threshold; a human drives.
    HumanLed,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::AutoExecute => write!(f, "auto_execute"),
            ConfidenceLevel::ExecuteReview => write!(f, "execute_review"),
            ConfidenceLevel::RequireApproval => write!(f, "require_approval"),
            ConfidenceLevel::HumanLed => write!(f, "human_led"),
        }
    }
}

/// A discrete unit of work an agent wants to perform, submitted to the
/// gate before it counts as taken. Ephemeral: nothing outlives the audit
/// entries and action records it produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessAction {
    pub id: ActionId,
    pub agent_role: AgentRole,
    /// Action kind, e.g. "tool_call" or "resolution_step".
    pub kind: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Confidence in 0..=100.
    pub confidence: f64,
    pub risk_level: RiskLevel,
    pub created_at: DateTime<Utc>,
}

impl HarnessAction {
    pub fn new(
        agent_role: AgentRole,
        kind: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            id: ActionId::new(),
            agent_role,
            kind: kind.into(),
            description: description.into(),
            parameters: Map::new(),
            confidence,
            risk_level: RiskLevel::Low,
            created_at: Utc::now(),
        }
    }

    pub fn with_risk(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }
}
