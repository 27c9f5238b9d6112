use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    AwaitLocation,
}

/// In-flight request correlated back to its order, e.g. "awaiting this
/// courier's location for this order".
#[derive(Debug, Clone)]
pub struct PendingAction {
    pub courier_id: Uuid,
    pub order_id: Uuid,
    pub kind: PendingKind,
    pub created_at: DateTime<Utc>,
}

/// One pending action per courier, keyed lookup, explicit TTL. Entries are
/// cleared on successful consumption; expired entries are dropped lazily.
pub struct PendingActionStore {
    actions: DashMap<Uuid, PendingAction>,
    ttl: Duration,
}

impl PendingActionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            actions: DashMap::new(),
            ttl,
        }
    }

    /// Registers the courier's pending action, replacing any previous one.
    pub fn put(&self, courier_id: Uuid, order_id: Uuid, kind: PendingKind) {
        self.actions.insert(
            courier_id,
            PendingAction {
                courier_id,
                order_id,
                kind,
                created_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, courier_id: Uuid) -> Option<PendingAction> {
        let expired = match self.actions.get(&courier_id) {
            Some(entry) => Utc::now() - entry.value().created_at > self.ttl,
            None => return None,
        };

        if expired {
            self.actions.remove(&courier_id);
            return None;
        }

        self.actions.get(&courier_id).map(|e| e.value().clone())
    }

    pub fn clear(&self, courier_id: Uuid) {
        self.actions.remove(&courier_id);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use uuid::Uuid;

    use super::{PendingActionStore, PendingKind};

    #[test]
    fn put_then_get_returns_the_action() {
        let store = PendingActionStore::new(Duration::hours(1));
        let courier = Uuid::new_v4();
        let order = Uuid::new_v4();

        store.put(courier, order, PendingKind::AwaitLocation);

        let action = store.get(courier).unwrap();
        assert_eq!(action.order_id, order);
        assert_eq!(action.kind, PendingKind::AwaitLocation);
    }

    #[test]
    fn newer_request_replaces_the_old_one() {
        let store = PendingActionStore::new(Duration::hours(1));
        let courier = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        store.put(courier, first, PendingKind::AwaitLocation);
        store.put(courier, second, PendingKind::AwaitLocation);

        assert_eq!(store.get(courier).unwrap().order_id, second);
    }

    #[test]
    fn cleared_action_is_gone() {
        let store = PendingActionStore::new(Duration::hours(1));
        let courier = Uuid::new_v4();

        store.put(courier, Uuid::new_v4(), PendingKind::AwaitLocation);
        store.clear(courier);

        assert!(store.get(courier).is_none());
    }

    #[test]
    fn expired_action_is_treated_as_absent() {
        let store = PendingActionStore::new(Duration::zero());
        let courier = Uuid::new_v4();

        store.put(courier, Uuid::new_v4(), PendingKind::AwaitLocation);

        assert!(store.get(courier).is_none());
    }
}
