use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Pending,
    Cancelled,
}

/// One courier offered one order. The readiness timer is a persisted
/// wall-clock timestamp, so it survives handler re-invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub courier_id: Uuid,
    /// Message shown to this candidate; absent when the send failed.
    pub message_id: Option<i64>,
    pub ready_since: Option<DateTime<Utc>>,
    /// Elapsed engagement in seconds, recorded when the timer stops.
    pub ready_for_secs: Option<i64>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
}

impl CandidateRecord {
    pub fn new(order_id: Uuid, courier_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            courier_id,
            message_id: None,
            ready_since: Some(Utc::now()),
            ready_for_secs: None,
            status: CandidateStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Converts a running timer into a recorded duration. No-op if already
    /// stopped.
    pub fn stop_timer(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.ready_since.take() {
            self.ready_for_secs = Some((now - since).num_seconds().max(0));
        }
    }
}
