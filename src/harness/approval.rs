//! Human approval requests and the registry that tracks them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::agents::AgentRole;
use crate::error::Result;
use crate::scoring::RiskLevel;
use crate::task::TaskId;

/// Unique identifier for an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalId(pub Uuid);

impl ApprovalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Return first 8 characters of the UUID for display.
    pub fn short(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for ApprovalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ApprovalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An outstanding request for a human decision on a gated action.
///
/// Lives in the registry from creation until approved, rejected, swept as
/// expired, or torn down with its owning context. `expires_at` is
/// advisory: nothing enforces it except an explicit sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanApprovalRequest {
    pub id: ApprovalId,
    pub task_id: TaskId,
    pub description: String,
    pub risk_assessment: RiskLevel,
    pub confidence: f64,
    pub recommending_roles: Vec<AgentRole>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl HumanApprovalRequest {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Synchronous human-in-the-loop decision capability.
///
/// Optional: without one, requests stay pending until resolved out of
/// band through `Harness::approve` / `Harness::reject`. A handler may
/// block; it is invoked without any harness lock held. A handler error is
/// treated as a rejection, never as a fault.
pub trait ApprovalHandler: Send + Sync {
    fn handle(&self, request: &HumanApprovalRequest) -> Result<bool>;
}

/// Tracks outstanding approval requests across all tasks.
#[derive(Debug, Default)]
pub struct ApprovalRegistry {
    requests: RwLock<HashMap<ApprovalId, HumanApprovalRequest>>,
}

impl ApprovalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&self, request: HumanApprovalRequest) {
        self.requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(request.id, request);
    }

    /// Remove a request, returning it if it was still outstanding.
    /// Removal is the single atomic resolution point: whichever of
    /// approve/reject/sweep/teardown gets here first wins.
    pub(crate) fn remove(&self, id: &ApprovalId) -> Option<HumanApprovalRequest> {
        self.requests
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn get(&self, id: &ApprovalId) -> Option<HumanApprovalRequest> {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.requests
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Remove and return every request expired as of `now`.
    pub(crate) fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<HumanApprovalRequest> {
        let mut requests = self
            .requests
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let expired: Vec<ApprovalId> = requests
            .values()
            .filter(|request| request.is_expired(now))
            .map(|request| request.id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| requests.remove(&id))
            .collect()
    }
}
