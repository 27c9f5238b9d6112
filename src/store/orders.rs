use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("order not found")]
    NotFound,

    #[error("order is in status {actual:?}")]
    WrongStatus { actual: OrderStatus },

    #[error("order is held by another courier")]
    WrongCourier,
}

/// Authoritative order records. `try_transition` is the only mutation path
/// once an order is in play: guard check and write happen under the entry
/// lock, so of any number of concurrent attempts exactly one wins.
pub struct OrderStore {
    orders: DashMap<Uuid, Order>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
        }
    }

    pub fn insert(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn get(&self, order_id: Uuid) -> Option<Order> {
        self.orders.get(&order_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Conditional write: applies `apply` only if the order exists, its
    /// status is one of `allowed_from`, and (when `acting` is given) the
    /// acting courier currently holds the order. Returns the updated order.
    pub fn try_transition<F>(
        &self,
        order_id: Uuid,
        allowed_from: &[OrderStatus],
        acting: Option<Uuid>,
        apply: F,
    ) -> Result<Order, TransitionError>
    where
        F: FnOnce(&mut Order),
    {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or(TransitionError::NotFound)?;
        let order = entry.value_mut();

        if !allowed_from.contains(&order.status) {
            return Err(TransitionError::WrongStatus {
                actual: order.status,
            });
        }

        if let Some(courier_id) = acting {
            if order.courier_id != Some(courier_id) {
                return Err(TransitionError::WrongCourier);
            }
        }

        apply(order);
        Ok(order.clone())
    }

    /// Records a message id without status preconditions. Used by the
    /// message lifecycle to remember which chat message is live.
    pub fn update<F>(&self, order_id: Uuid, apply: F) -> Result<Order, TransitionError>
    where
        F: FnOnce(&mut Order),
    {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or(TransitionError::NotFound)?;
        apply(entry.value_mut());
        Ok(entry.value().clone())
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{OrderStore, TransitionError};
    use crate::models::courier::GeoPoint;
    use crate::models::order::{Order, OrderStatus};

    fn order(status: OrderStatus, courier_id: Option<Uuid>) -> Order {
        Order {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            status,
            courier_id,
            dropoff: GeoPoint { lat: 52.0, lng: 13.0 },
            distance_km: Some(2.0),
            duration_min: Some(15),
            total_amount: 1200,
            payments: Vec::new(),
            payout: None,
            branch_message_id: None,
            courier_message_id: None,
            search_started_at: Utc::now(),
            en_route_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn transition_applies_when_guards_hold() {
        let store = OrderStore::new();
        let courier = Uuid::new_v4();
        let o = order(OrderStatus::Assigned, Some(courier));
        let id = o.id;
        store.insert(o);

        let updated = store
            .try_transition(id, &[OrderStatus::Assigned], Some(courier), |o| {
                o.status = OrderStatus::EnRoute;
            })
            .unwrap();

        assert_eq!(updated.status, OrderStatus::EnRoute);
        assert_eq!(store.get(id).unwrap().status, OrderStatus::EnRoute);
    }

    #[test]
    fn wrong_status_is_rejected_without_mutation() {
        let store = OrderStore::new();
        let courier = Uuid::new_v4();
        let o = order(OrderStatus::Searching, None);
        let id = o.id;
        store.insert(o);

        let err = store
            .try_transition(id, &[OrderStatus::EnRoute], Some(courier), |o| {
                o.status = OrderStatus::Completed;
            })
            .unwrap_err();

        assert_eq!(
            err,
            TransitionError::WrongStatus {
                actual: OrderStatus::Searching
            }
        );
        assert_eq!(store.get(id).unwrap().status, OrderStatus::Searching);
    }

    #[test]
    fn wrong_courier_is_rejected_without_mutation() {
        let store = OrderStore::new();
        let holder = Uuid::new_v4();
        let o = order(OrderStatus::Assigned, Some(holder));
        let id = o.id;
        store.insert(o);

        let err = store
            .try_transition(id, &[OrderStatus::Assigned], Some(Uuid::new_v4()), |o| {
                o.status = OrderStatus::EnRoute;
            })
            .unwrap_err();

        assert_eq!(err, TransitionError::WrongCourier);
        assert_eq!(store.get(id).unwrap().status, OrderStatus::Assigned);
        assert_eq!(store.get(id).unwrap().courier_id, Some(holder));
    }

    #[test]
    fn missing_order_is_not_found() {
        let store = OrderStore::new();
        let err = store
            .try_transition(Uuid::new_v4(), &[OrderStatus::Searching], None, |_| {})
            .unwrap_err();
        assert_eq!(err, TransitionError::NotFound);
    }
}
