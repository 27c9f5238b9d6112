use std::sync::Arc;

use chrono::Duration;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::chat::ChatApi;
use crate::models::courier::Courier;
use crate::models::tenant::TenantSettings;
use crate::models::zone::DeliveryZone;
use crate::observability::metrics::Metrics;
use crate::store::audit::AuditLog;
use crate::store::candidates::CandidateRegistry;
use crate::store::orders::OrderStore;
use crate::store::pending::PendingActionStore;

pub struct AppState {
    pub tenants: DashMap<Uuid, TenantSettings>,
    pub couriers: DashMap<Uuid, Courier>,
    pub zones: DashMap<Uuid, DeliveryZone>,
    pub orders: OrderStore,
    pub candidates: CandidateRegistry,
    pub pending: PendingActionStore,
    pub audit: AuditLog,
    pub chat: Arc<dyn ChatApi>,
    pub broadcast_tx: mpsc::Sender<Uuid>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        chat: Arc<dyn ChatApi>,
        broadcast_queue_size: usize,
        pending_action_ttl: Duration,
    ) -> (Self, mpsc::Receiver<Uuid>) {
        let (broadcast_tx, broadcast_rx) = mpsc::channel(broadcast_queue_size);

        (
            Self {
                tenants: DashMap::new(),
                couriers: DashMap::new(),
                zones: DashMap::new(),
                orders: OrderStore::new(),
                candidates: CandidateRegistry::new(),
                pending: PendingActionStore::new(pending_action_ttl),
                audit: AuditLog::new(),
                chat,
                broadcast_tx,
                metrics: Metrics::new(),
            },
            broadcast_rx,
        )
    }

    pub fn tenant_settings(&self, tenant_id: Uuid) -> Option<TenantSettings> {
        self.tenants.get(&tenant_id).map(|entry| entry.value().clone())
    }

    /// Resolves a courier by its chat-platform identity within one tenant.
    pub fn courier_by_chat_id(&self, tenant_id: Uuid, chat_id: i64) -> Option<Courier> {
        self.couriers
            .iter()
            .find(|entry| {
                let courier = entry.value();
                courier.tenant_id == tenant_id && courier.chat_id == chat_id
            })
            .map(|entry| entry.value().clone())
    }

    pub fn courier(&self, courier_id: Uuid) -> Option<Courier> {
        self.couriers.get(&courier_id).map(|entry| entry.value().clone())
    }

    pub fn zone(&self, zone_id: Uuid) -> Option<DeliveryZone> {
        self.zones.get(&zone_id).map(|entry| entry.value().clone())
    }
}
