//! Resolves who holds an order: the compare-and-swap acceptance and the
//! courier-initiated release back to the pool.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::chat::{format, lifecycle};
use crate::engine::queue::enqueue_broadcast;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};
use crate::state::AppState;
use crate::store::orders::TransitionError;

/// Assigns the order to the courier. Of any number of concurrent attempts
/// exactly one wins; the rest fail the status guard.
pub async fn accept(state: &AppState, order_id: Uuid, courier_id: Uuid) -> Result<Order, AppError> {
    let courier = state
        .courier(courier_id)
        .ok_or_else(|| AppError::NotFound(format!("courier {courier_id} not found")))?;

    let order = state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.status.is_archived() {
        return Err(AppError::NotFound(format!("order {order_id} is archived")));
    }

    if courier.tenant_id != order.tenant_id {
        return Err(AppError::Unauthorized(
            "courier belongs to another tenant".to_string(),
        ));
    }

    let settings = state.tenant_settings(order.tenant_id).ok_or_else(|| {
        AppError::Internal(format!("no settings for tenant {}", order.tenant_id))
    })?;

    let updated = state
        .orders
        .try_transition(order_id, &[OrderStatus::Searching], None, |o| {
            o.status = OrderStatus::Assigned;
            o.courier_id = Some(courier_id);
        })
        .map_err(|err| match err {
            TransitionError::NotFound => {
                AppError::NotFound(format!("order {order_id} not found"))
            }
            TransitionError::WrongStatus { .. } => {
                AppError::PreconditionFailed("order is already taken".to_string())
            }
            TransitionError::WrongCourier => {
                AppError::Unauthorized("order is held by another courier".to_string())
            }
        })?;

    // Everyone minus the winner: cancel, stop timers, drop their messages.
    let cancelled = state.candidates.cancel_for_order(order_id, Some(courier_id));
    lifecycle::delete_candidate_messages(state, &settings, &cancelled).await;

    lifecycle::send_assigned_message(state, &settings, &updated, &courier).await;
    lifecycle::update_branch_message(
        state,
        &settings,
        order_id,
        &format::branch_assigned_text(&updated, &courier.name),
    )
    .await;

    state.audit.record(
        order.tenant_id,
        Some(order_id),
        Some(courier_id),
        format!("order accepted by {}", courier.name),
    );
    state
        .metrics
        .transitions_total
        .with_label_values(&["assigned", "success"])
        .inc();

    info!(order_id = %order_id, courier_id = %courier_id, "order assigned");

    state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::Internal("order vanished after assignment".to_string()))
}

/// Returns the order to the pool: only succeeds while the acting courier
/// still holds it. Clears the assignment, cancels all candidates, removes
/// their messages, and re-triggers a fresh broadcast.
pub async fn release(
    state: &AppState,
    order_id: Uuid,
    courier_id: Uuid,
    reason: &str,
) -> Result<Order, AppError> {
    let order = state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.status.is_archived() {
        return Err(AppError::NotFound(format!("order {order_id} is archived")));
    }

    let settings = state.tenant_settings(order.tenant_id).ok_or_else(|| {
        AppError::Internal(format!("no settings for tenant {}", order.tenant_id))
    })?;

    let mut superseded_private = None;
    let updated = state
        .orders
        .try_transition(
            order_id,
            &[
                OrderStatus::Assigned,
                OrderStatus::EnRoute,
                OrderStatus::Completing,
            ],
            Some(courier_id),
            |o| {
                superseded_private = o.courier_message_id.take();
                o.status = OrderStatus::Searching;
                o.courier_id = None;
                o.en_route_at = None;
                o.search_started_at = Utc::now();
            },
        )
        .map_err(|err| match err {
            TransitionError::NotFound => {
                AppError::NotFound(format!("order {order_id} not found"))
            }
            TransitionError::WrongStatus { actual } => AppError::PreconditionFailed(format!(
                "order cannot be released from {actual:?}"
            )),
            TransitionError::WrongCourier => {
                AppError::Unauthorized("order is held by another courier".to_string())
            }
        })?;

    state.pending.clear(courier_id);

    let cancelled = state.candidates.cancel_for_order(order_id, None);
    lifecycle::delete_candidate_messages(state, &settings, &cancelled).await;

    if let Some(message_id) = superseded_private {
        if let Some(courier) = state.courier(courier_id) {
            lifecycle::delete_message_quietly(
                state,
                &settings,
                courier.chat_id,
                message_id,
                order_id,
            )
            .await;
        }
    }

    state.audit.record(
        order.tenant_id,
        Some(order_id),
        Some(courier_id),
        format!("courier released the order: {reason}"),
    );
    state
        .metrics
        .transitions_total
        .with_label_values(&["searching", "success"])
        .inc();

    enqueue_broadcast(state, order_id).await?;

    info!(order_id = %order_id, courier_id = %courier_id, reason, "order released to the pool");

    Ok(updated)
}
