use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_COMPLETION_RADIUS_M: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantSettings {
    pub tenant_id: Uuid,
    pub bot_token: String,
    /// Branch-level dispatch channel.
    pub branch_chat_id: i64,
    pub completion_radius_m: Option<f64>,
    pub require_location_confirmation: bool,
}

impl TenantSettings {
    pub fn completion_radius_m(&self) -> f64 {
        self.completion_radius_m
            .unwrap_or(DEFAULT_COMPLETION_RADIUS_M)
    }
}
