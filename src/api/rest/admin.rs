//! Upstream surface: the collaborators that create orders, register
//! couriers and zones, and record acceptances all feed the stores here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::assignment;
use crate::engine::queue::enqueue_broadcast;
use crate::error::AppError;
use crate::models::courier::{Courier, CourierKind, GeoPoint, VehicleType};
use crate::models::order::{Order, OrderStatus, PaymentPart};
use crate::models::tenant::TenantSettings;
use crate::models::zone::DeliveryZone;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tenants", post(create_tenant))
        .route("/zones", post(create_zone))
        .route("/couriers", post(create_courier).get(list_couriers))
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/accept", post(accept_order))
}

#[derive(Deserialize)]
pub struct CreateTenantRequest {
    pub bot_token: String,
    pub branch_chat_id: i64,
    pub completion_radius_m: Option<f64>,
    pub require_location_confirmation: bool,
}

async fn create_tenant(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateTenantRequest>,
) -> Result<Json<TenantSettings>, AppError> {
    if payload.bot_token.trim().is_empty() {
        return Err(AppError::BadRequest("bot_token cannot be empty".to_string()));
    }

    let settings = TenantSettings {
        tenant_id: Uuid::new_v4(),
        bot_token: payload.bot_token,
        branch_chat_id: payload.branch_chat_id,
        completion_radius_m: payload.completion_radius_m,
        require_location_confirmation: payload.require_location_confirmation,
    };

    state.tenants.insert(settings.tenant_id, settings.clone());
    Ok(Json(settings))
}

#[derive(Deserialize)]
pub struct CreateZoneRequest {
    pub tenant_id: Uuid,
    pub name: String,
    pub courier_payment: Option<i64>,
    pub price: Option<i64>,
    #[serde(default)]
    pub per_km_enabled: bool,
    pub price_per_km: Option<i64>,
    pub graduation_km: Option<f64>,
}

async fn create_zone(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateZoneRequest>,
) -> Result<Json<DeliveryZone>, AppError> {
    if !state.tenants.contains_key(&payload.tenant_id) {
        return Err(AppError::NotFound(format!(
            "tenant {} not registered",
            payload.tenant_id
        )));
    }

    let zone = DeliveryZone {
        id: Uuid::new_v4(),
        tenant_id: payload.tenant_id,
        name: payload.name,
        courier_payment: payload.courier_payment,
        price: payload.price,
        per_km_enabled: payload.per_km_enabled,
        price_per_km: payload.price_per_km,
        graduation_km: payload.graduation_km,
    };

    state.zones.insert(zone.id, zone.clone());
    Ok(Json(zone))
}

#[derive(Deserialize)]
pub struct CreateCourierRequest {
    pub tenant_id: Uuid,
    pub chat_id: i64,
    pub name: String,
    pub vehicle: VehicleType,
    pub zone_id: Option<Uuid>,
    pub kind: CourierKind,
}

async fn create_courier(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCourierRequest>,
) -> Result<Json<Courier>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if !state.tenants.contains_key(&payload.tenant_id) {
        return Err(AppError::NotFound(format!(
            "tenant {} not registered",
            payload.tenant_id
        )));
    }

    if let Some(zone_id) = payload.zone_id {
        if state.zone(zone_id).is_none() {
            return Err(AppError::NotFound(format!("zone {zone_id} not found")));
        }
    }

    let courier = Courier {
        id: Uuid::new_v4(),
        tenant_id: payload.tenant_id,
        chat_id: payload.chat_id,
        name: payload.name,
        vehicle: payload.vehicle,
        zone_id: payload.zone_id,
        kind: payload.kind,
        created_at: Utc::now(),
    };

    state.couriers.insert(courier.id, courier.clone());
    Ok(Json(courier))
}

async fn list_couriers(State(state): State<Arc<AppState>>) -> Json<Vec<Courier>> {
    let couriers = state
        .couriers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    Json(couriers)
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub tenant_id: Uuid,
    pub dropoff: GeoPoint,
    pub distance_km: Option<f64>,
    pub duration_min: Option<i64>,
    pub total_amount: i64,
    #[serde(default)]
    pub payments: Vec<PaymentPart>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if !state.tenants.contains_key(&payload.tenant_id) {
        return Err(AppError::NotFound(format!(
            "tenant {} not registered",
            payload.tenant_id
        )));
    }

    let order = Order {
        id: Uuid::new_v4(),
        tenant_id: payload.tenant_id,
        status: OrderStatus::Searching,
        courier_id: None,
        dropoff: payload.dropoff,
        distance_km: payload.distance_km,
        duration_min: payload.duration_min,
        total_amount: payload.total_amount,
        payments: payload.payments,
        payout: None,
        branch_message_id: None,
        courier_message_id: None,
        search_started_at: Utc::now(),
        en_route_at: None,
        completed_at: None,
    };

    state.orders.insert(order.clone());
    enqueue_broadcast(&state, order.id).await?;

    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order))
}

#[derive(Deserialize)]
pub struct AcceptOrderRequest {
    pub courier_id: Uuid,
}

async fn accept_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = assignment::accept(&state, id, payload.courier_id).await?;
    Ok(Json(order))
}
