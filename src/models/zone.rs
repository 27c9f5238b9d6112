use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Geographic/pricing grouping that determines a courier's base payout and
/// optional per-kilometer surcharge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZone {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub courier_payment: Option<i64>,
    pub price: Option<i64>,
    pub per_km_enabled: bool,
    pub price_per_km: Option<i64>,
    /// Distance step the billed kilometers are rounded to.
    pub graduation_km: Option<f64>,
}
