use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::candidate::{CandidateRecord, CandidateStatus};

/// Per-order fan-out records: every courier an order was offered to, each
/// with its outward message and readiness timer.
pub struct CandidateRegistry {
    records: DashMap<Uuid, CandidateRecord>,
}

impl CandidateRegistry {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    pub fn insert(&self, record: CandidateRecord) {
        self.records.insert(record.id, record);
    }

    pub fn get(&self, id: Uuid) -> Option<CandidateRecord> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    pub fn for_order(&self, order_id: Uuid) -> Vec<CandidateRecord> {
        self.records
            .iter()
            .filter(|entry| entry.value().order_id == order_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn set_message_id(&self, id: Uuid, message_id: i64) {
        if let Some(mut entry) = self.records.get_mut(&id) {
            entry.value_mut().message_id = Some(message_id);
        }
    }

    /// Detaches the outward message from the record, returning its id so the
    /// caller can delete the superseded message.
    pub fn take_message_id(&self, id: Uuid) -> Option<i64> {
        self.records
            .get_mut(&id)
            .and_then(|mut entry| entry.value_mut().message_id.take())
    }

    /// Cancels every pending candidate of the order except `keep`, stopping
    /// their readiness timers. Returns the cancelled rows so the caller can
    /// reconcile their chat messages.
    pub fn cancel_for_order(&self, order_id: Uuid, keep: Option<Uuid>) -> Vec<CandidateRecord> {
        let now = Utc::now();
        let mut cancelled = Vec::new();

        for mut entry in self.records.iter_mut() {
            let record = entry.value_mut();
            if record.order_id != order_id || record.status != CandidateStatus::Pending {
                continue;
            }
            if keep == Some(record.courier_id) {
                continue;
            }
            record.status = CandidateStatus::Cancelled;
            record.stop_timer(now);
            cancelled.push(record.clone());
        }

        cancelled
    }

    /// Stops every running readiness timer of the order, recording elapsed
    /// engagement. Rows stay in their current status.
    pub fn stop_timers_for_order(&self, order_id: Uuid) {
        let now = Utc::now();
        for mut entry in self.records.iter_mut() {
            let record = entry.value_mut();
            if record.order_id == order_id {
                record.stop_timer(now);
            }
        }
    }
}

impl Default for CandidateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::CandidateRegistry;
    use crate::models::candidate::{CandidateRecord, CandidateStatus};

    #[test]
    fn cancel_for_order_spares_the_winner() {
        let registry = CandidateRegistry::new();
        let order_id = Uuid::new_v4();
        let winner = Uuid::new_v4();
        let loser = Uuid::new_v4();

        registry.insert(CandidateRecord::new(order_id, winner));
        registry.insert(CandidateRecord::new(order_id, loser));
        registry.insert(CandidateRecord::new(Uuid::new_v4(), loser));

        let cancelled = registry.cancel_for_order(order_id, Some(winner));

        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].courier_id, loser);
        assert_eq!(cancelled[0].status, CandidateStatus::Cancelled);
        assert!(cancelled[0].ready_since.is_none());
        assert!(cancelled[0].ready_for_secs.is_some());

        let survivors: Vec<_> = registry
            .for_order(order_id)
            .into_iter()
            .filter(|r| r.status == CandidateStatus::Pending)
            .collect();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].courier_id, winner);
    }

    #[test]
    fn stop_timers_records_duration_once() {
        let registry = CandidateRegistry::new();
        let order_id = Uuid::new_v4();
        let record = CandidateRecord::new(order_id, Uuid::new_v4());
        let id = record.id;
        registry.insert(record);

        registry.stop_timers_for_order(order_id);
        let first = registry.get(id).unwrap().ready_for_secs;
        assert!(first.is_some());

        registry.stop_timers_for_order(order_id);
        assert_eq!(registry.get(id).unwrap().ready_for_secs, first);
    }
}
