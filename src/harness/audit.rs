//! Append-only audit trail of gating, approval, and lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{PoisonError, RwLock};

use crate::task::TaskId;

/// One immutable audit event. Entries are only ever appended; nothing
/// mutates or removes them individually, and they outlive the task that
/// produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl AuditEntry {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            attributes: Map::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The task id attribute, when the event is task-scoped.
    pub fn task_id(&self) -> Option<&str> {
        self.attributes.get("task_id").and_then(Value::as_str)
    }
}

/// In-memory append-only event store with point-in-time filtered reads.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, entry: AuditEntry) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Snapshot all entries in insertion order, optionally filtered to a
    /// single task.
    pub fn query(&self, task_id: Option<&TaskId>) -> Vec<AuditEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match task_id {
            Some(id) => {
                let id = id.to_string();
                entries
                    .iter()
                    .filter(|entry| entry.task_id() == Some(id.as_str()))
                    .cloned()
                    .collect()
            }
            None => entries.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
