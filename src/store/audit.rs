use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_id: Option<Uuid>,
    pub courier_id: Option<Uuid>,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Append-only trail for operational diagnosis. Never consulted to drive
/// behavior; pending-action correlation lives in its own keyed store.
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn record(
        &self,
        tenant_id: Uuid,
        order_id: Option<Uuid>,
        courier_id: Option<Uuid>,
        message: impl Into<String>,
    ) {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            tenant_id,
            order_id,
            courier_id,
            message: message.into(),
            at: Utc::now(),
        };
        self.entries
            .write()
            .expect("audit log lock poisoned")
            .push(entry);
    }

    pub fn for_order(&self, order_id: Uuid) -> Vec<AuditEntry> {
        self.entries
            .read()
            .expect("audit log lock poisoned")
            .iter()
            .filter(|entry| entry.order_id == Some(order_id))
            .cloned()
            .collect()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
