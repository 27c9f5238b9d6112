use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleType {
    Walking,
    Bicycle,
    Scooter,
    Car,
}

/// Own staff vs. external delivery partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourierKind {
    Staff,
    Partner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Courier {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Identity on the chat platform.
    pub chat_id: i64,
    pub name: String,
    pub vehicle: VehicleType,
    pub zone_id: Option<Uuid>,
    pub kind: CourierKind,
    pub created_at: DateTime<Utc>,
}
