//! The delivery lifecycle state machine: validates preconditions and the
//! acting courier before any mutation, then keeps chat surfaces in step.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::chat::{format, lifecycle};
use crate::engine::payout::calculate_payout;
use crate::error::AppError;
use crate::geo::haversine_m;
use crate::models::courier::{Courier, GeoPoint};
use crate::models::order::{Order, OrderStatus};
use crate::models::tenant::TenantSettings;
use crate::state::AppState;
use crate::store::orders::TransitionError;
use crate::store::pending::PendingKind;

pub enum CompleteOutcome {
    Completed(Order),
    /// Completion is gated on a location confirmation from the courier.
    AwaitingLocation(Order),
}

pub enum LocationOutcome {
    Completed(Order),
    /// Legitimate business outcome, not an error: the courier is too far
    /// from the dropoff and the order is left untouched.
    OutsideRadius { distance_m: f64, radius_m: f64 },
    /// Nothing was waiting on this courier's location.
    NoPendingAction,
}

fn map_not_found(order_id: Uuid) -> AppError {
    AppError::NotFound(format!("order {order_id} not found"))
}

/// `assigned -> en_route`, guarded by the acting courier. A replayed
/// callback fails the status guard and mutates nothing.
pub async fn mark_en_route(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
) -> Result<Order, AppError> {
    let order = state.orders.get(order_id).ok_or_else(|| map_not_found(order_id))?;

    if order.status.is_archived() {
        return Err(AppError::NotFound(format!("order {order_id} is archived")));
    }

    let settings = state.tenant_settings(order.tenant_id).ok_or_else(|| {
        AppError::Internal(format!("no settings for tenant {}", order.tenant_id))
    })?;

    let updated = state
        .orders
        .try_transition(order_id, &[OrderStatus::Assigned], Some(courier_id), |o| {
            o.status = OrderStatus::EnRoute;
            o.en_route_at = Some(Utc::now());
        })
        .map_err(|err| match err {
            TransitionError::NotFound => map_not_found(order_id),
            TransitionError::WrongStatus { actual: OrderStatus::EnRoute } => {
                AppError::PreconditionFailed("order is already en route".to_string())
            }
            TransitionError::WrongStatus { actual } => AppError::PreconditionFailed(format!(
                "order cannot go en route from {actual:?}"
            )),
            TransitionError::WrongCourier => {
                AppError::Unauthorized("order is held by another courier".to_string())
            }
        })?;

    if let Some(courier) = state.courier(courier_id) {
        lifecycle::replace_courier_message(
            state,
            &settings,
            order_id,
            courier.chat_id,
            &format::en_route_text(&updated),
            &lifecycle::action_buttons(&updated),
        )
        .await;
    }

    state.audit.record(
        order.tenant_id,
        Some(order_id),
        Some(courier_id),
        "courier en route",
    );
    state
        .metrics
        .transitions_total
        .with_label_values(&["en_route", "success"])
        .inc();

    info!(order_id = %order_id, courier_id = %courier_id, "courier en route");
    Ok(updated)
}

/// `en_route -> completed`, or `en_route -> completing` when the tenant
/// requires a location confirmation first.
pub async fn complete(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
) -> Result<CompleteOutcome, AppError> {
    let order = state.orders.get(order_id).ok_or_else(|| map_not_found(order_id))?;

    if order.status.is_archived() {
        return Err(AppError::NotFound(format!("order {order_id} is archived")));
    }

    let settings = state.tenant_settings(order.tenant_id).ok_or_else(|| {
        AppError::Internal(format!("no settings for tenant {}", order.tenant_id))
    })?;

    if !settings.require_location_confirmation {
        let updated = finalize_completion(state, &settings, order_id, courier_id).await?;
        return Ok(CompleteOutcome::Completed(updated));
    }

    let updated = state
        .orders
        .try_transition(order_id, &[OrderStatus::EnRoute], Some(courier_id), |o| {
            o.status = OrderStatus::Completing;
        })
        .map_err(|err| match err {
            TransitionError::NotFound => map_not_found(order_id),
            TransitionError::WrongStatus { actual: OrderStatus::Assigned } => {
                AppError::PreconditionFailed("go en route before completing".to_string())
            }
            TransitionError::WrongStatus { actual: OrderStatus::Completing } => {
                AppError::PreconditionFailed(
                    "share your location to confirm delivery".to_string(),
                )
            }
            TransitionError::WrongStatus { actual } => AppError::PreconditionFailed(format!(
                "order cannot be completed from {actual:?}"
            )),
            TransitionError::WrongCourier => {
                AppError::Unauthorized("order is held by another courier".to_string())
            }
        })?;

    state
        .pending
        .put(courier_id, order_id, PendingKind::AwaitLocation);

    if let Some(courier) = state.courier(courier_id) {
        lifecycle::replace_courier_message(
            state,
            &settings,
            order_id,
            courier.chat_id,
            "Share your location to confirm the delivery",
            &lifecycle::action_buttons(&updated),
        )
        .await;
    }

    state.audit.record(
        order.tenant_id,
        Some(order_id),
        Some(courier_id),
        "awaiting location confirmation",
    );

    info!(order_id = %order_id, courier_id = %courier_id, "awaiting location confirmation");
    Ok(CompleteOutcome::AwaitingLocation(updated))
}

/// A shared location answering a pending confirmation request. Within the
/// radius the order completes exactly once; outside, the courier is told
/// the measured distance and may try again.
pub async fn confirm_location(
    state: &AppState,
    settings: &TenantSettings,
    courier: &Courier,
    location: GeoPoint,
) -> Result<LocationOutcome, AppError> {
    let Some(pending) = state.pending.get(courier.id) else {
        return Ok(LocationOutcome::NoPendingAction);
    };

    let Some(order) = state.orders.get(pending.order_id) else {
        state.pending.clear(courier.id);
        return Ok(LocationOutcome::NoPendingAction);
    };

    let distance_m = haversine_m(&order.dropoff, &location);
    let radius_m = settings.completion_radius_m();

    if distance_m > radius_m {
        info!(
            order_id = %order.id,
            courier_id = %courier.id,
            distance_m,
            radius_m,
            "completion refused: outside geofence"
        );
        return Ok(LocationOutcome::OutsideRadius { distance_m, radius_m });
    }

    let updated = finalize_completion(state, settings, order.id, courier.id).await?;
    Ok(LocationOutcome::Completed(updated))
}

/// The single entry into `completed`. The compare-and-swap gates every side
/// effect, so payout, timers, messages, and audit all happen exactly once
/// even under duplicate deliveries.
pub async fn finalize_completion(
    state: &AppState,
    settings: &TenantSettings,
    order_id: Uuid,
    courier_id: Uuid,
) -> Result<Order, AppError> {
    let current = state.orders.get(order_id).ok_or_else(|| map_not_found(order_id))?;

    let zone = state
        .courier(courier_id)
        .and_then(|c| c.zone_id)
        .and_then(|zone_id| state.zone(zone_id));
    let payout = zone.map(|z| calculate_payout(&z, current.distance_km));

    let updated = state
        .orders
        .try_transition(
            order_id,
            &[OrderStatus::EnRoute, OrderStatus::Completing],
            Some(courier_id),
            |o| {
                o.status = OrderStatus::Completed;
                o.completed_at = Some(Utc::now());
                if payout.is_some() {
                    o.payout = payout;
                }
            },
        )
        .map_err(|err| match err {
            TransitionError::NotFound => map_not_found(order_id),
            TransitionError::WrongStatus { actual: OrderStatus::Assigned } => {
                AppError::PreconditionFailed("go en route before completing".to_string())
            }
            TransitionError::WrongStatus { actual: OrderStatus::Completed } => {
                AppError::PreconditionFailed("order is already completed".to_string())
            }
            TransitionError::WrongStatus { actual } => AppError::PreconditionFailed(format!(
                "order cannot be completed from {actual:?}"
            )),
            TransitionError::WrongCourier => {
                AppError::Unauthorized("order is held by another courier".to_string())
            }
        })?;

    state.candidates.cancel_for_order(order_id, None);
    state.pending.clear(courier_id);

    lifecycle::clear_order_messages(state, settings, order_id).await;

    state.audit.record(
        updated.tenant_id,
        Some(order_id),
        Some(courier_id),
        match updated.payout {
            Some(amount) => format!("order completed; payout {amount}"),
            None => "order completed; no zone pricing, payout unset".to_string(),
        },
    );
    state
        .metrics
        .transitions_total
        .with_label_values(&["completed", "success"])
        .inc();

    info!(order_id = %order_id, courier_id = %courier_id, payout = ?updated.payout, "order completed");

    state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::Internal("order vanished after completion".to_string()))
}
