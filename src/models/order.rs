use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::courier::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Searching,
    Assigned,
    EnRoute,
    Completing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Archived orders are immutable to the coordinator.
    pub fn is_archived(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPart {
    pub method: PaymentMethod,
    pub amount: i64,
    pub paid: bool,
    pub cash_tendered: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub status: OrderStatus,
    pub courier_id: Option<Uuid>,
    pub dropoff: GeoPoint,
    pub distance_km: Option<f64>,
    pub duration_min: Option<i64>,
    /// Integer currency units.
    pub total_amount: i64,
    pub payments: Vec<PaymentPart>,
    pub payout: Option<i64>,
    pub branch_message_id: Option<i64>,
    pub courier_message_id: Option<i64>,
    pub search_started_at: DateTime<Utc>,
    pub en_route_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
