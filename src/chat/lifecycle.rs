//! Owns *when* chat messages are created and deleted, and which message
//! supersedes which. At most one live "current state" message exists per
//! (order, audience) pair; the audiences are the branch channel, each
//! candidate, and the assigned courier.
//!
//! All platform calls are best-effort: a failed delete or send is logged and
//! the surrounding flow proceeds.

use tracing::warn;
use uuid::Uuid;

use crate::api::rest::webhook::CourierAction;
use crate::chat::{ChatButton, format};
use crate::models::candidate::{CandidateRecord, CandidateStatus};
use crate::models::courier::Courier;
use crate::models::order::{Order, OrderStatus};
use crate::models::tenant::TenantSettings;
use crate::state::AppState;

pub async fn delete_message_quietly(
    state: &AppState,
    settings: &TenantSettings,
    chat_id: i64,
    message_id: i64,
    order_id: Uuid,
) {
    if let Err(err) = state
        .chat
        .delete_message(&settings.bot_token, chat_id, message_id)
        .await
    {
        warn!(order_id = %order_id, chat_id, message_id, error = %err, "failed to delete chat message");
    }
}

/// Buttons the assigned courier sees for the order's current state.
pub fn action_buttons(order: &Order) -> Vec<ChatButton> {
    match order.status {
        OrderStatus::Assigned => vec![
            ChatButton {
                label: "On my way".to_string(),
                callback_data: CourierAction::EnRoute.callback_data(order.id),
            },
            ChatButton {
                label: "Decline".to_string(),
                callback_data: CourierAction::Cancel.callback_data(order.id),
            },
        ],
        OrderStatus::EnRoute | OrderStatus::Completing => vec![
            ChatButton {
                label: "Delivered".to_string(),
                callback_data: CourierAction::Complete.callback_data(order.id),
            },
            ChatButton {
                label: "Decline".to_string(),
                callback_data: CourierAction::Cancel.callback_data(order.id),
            },
        ],
        _ => Vec::new(),
    }
}

/// Replaces the branch channel message for the order.
pub async fn update_branch_message(
    state: &AppState,
    settings: &TenantSettings,
    order_id: Uuid,
    text: &str,
) {
    let Some(order) = state.orders.get(order_id) else {
        return;
    };

    if let Some(previous) = order.branch_message_id {
        delete_message_quietly(state, settings, settings.branch_chat_id, previous, order_id).await;
    }

    let sent = match state
        .chat
        .send_message(&settings.bot_token, settings.branch_chat_id, text, &[])
        .await
    {
        Ok(message_id) => Some(message_id),
        Err(err) => {
            warn!(order_id = %order_id, error = %err, "failed to send branch message");
            None
        }
    };

    let _ = state.orders.update(order_id, |o| o.branch_message_id = sent);
}

/// Fans the order out: fresh branch message plus an offer to every courier
/// of the tenant, each backed by a candidate record with a running
/// readiness timer. Returns the number of candidates offered.
pub async fn broadcast_order(
    state: &AppState,
    settings: &TenantSettings,
    order: &Order,
) -> usize {
    update_branch_message(state, settings, order.id, &format::branch_text(order)).await;

    let couriers: Vec<Courier> = state
        .couriers
        .iter()
        .filter(|entry| entry.value().tenant_id == order.tenant_id)
        .map(|entry| entry.value().clone())
        .collect();

    let mut offered = 0;
    for courier in couriers {
        let record = CandidateRecord::new(order.id, courier.id);
        let record_id = record.id;
        state.candidates.insert(record);

        match state
            .chat
            .send_message(
                &settings.bot_token,
                courier.chat_id,
                &format::offer_text(order),
                &[],
            )
            .await
        {
            Ok(message_id) => {
                state.candidates.set_message_id(record_id, message_id);
                offered += 1;
            }
            Err(err) => {
                warn!(
                    order_id = %order.id,
                    courier_id = %courier.id,
                    error = %err,
                    "failed to send candidate offer"
                );
            }
        }
    }

    offered
}

/// Sends the winner their private "you have the order" message, superseding
/// both their offer message and any previous private message.
pub async fn send_assigned_message(
    state: &AppState,
    settings: &TenantSettings,
    order: &Order,
    courier: &Courier,
) {
    for record in state.candidates.for_order(order.id) {
        if record.courier_id == courier.id && record.status == CandidateStatus::Pending {
            if let Some(message_id) = state.candidates.take_message_id(record.id) {
                delete_message_quietly(state, settings, courier.chat_id, message_id, order.id).await;
            }
        }
    }

    replace_courier_message(
        state,
        settings,
        order.id,
        courier.chat_id,
        &format::assigned_text(order),
        &action_buttons(order),
    )
    .await;
}

/// Replaces the assigned courier's private message for the order.
pub async fn replace_courier_message(
    state: &AppState,
    settings: &TenantSettings,
    order_id: Uuid,
    courier_chat_id: i64,
    text: &str,
    buttons: &[ChatButton],
) {
    let Some(order) = state.orders.get(order_id) else {
        return;
    };

    if let Some(previous) = order.courier_message_id {
        delete_message_quietly(state, settings, courier_chat_id, previous, order_id).await;
    }

    let sent = match state
        .chat
        .send_message(&settings.bot_token, courier_chat_id, text, buttons)
        .await
    {
        Ok(message_id) => Some(message_id),
        Err(err) => {
            warn!(order_id = %order_id, error = %err, "failed to send courier message");
            None
        }
    };

    let _ = state.orders.update(order_id, |o| o.courier_message_id = sent);
}

/// Deletes the cancelled candidates' offer messages.
pub async fn delete_candidate_messages(
    state: &AppState,
    settings: &TenantSettings,
    records: &[CandidateRecord],
) {
    for record in records {
        let Some(message_id) = record.message_id else {
            continue;
        };
        let Some(courier) = state.courier(record.courier_id) else {
            continue;
        };
        delete_message_quietly(state, settings, courier.chat_id, message_id, record.order_id).await;
        state.candidates.take_message_id(record.id);
    }
}

/// Removes every live message referencing the order: candidate offers, the
/// assigned courier's private message, and the branch broadcast.
pub async fn clear_order_messages(state: &AppState, settings: &TenantSettings, order_id: Uuid) {
    let records = state.candidates.for_order(order_id);
    delete_candidate_messages(state, settings, &records).await;

    let Some(order) = state.orders.get(order_id) else {
        return;
    };

    if let Some(message_id) = order.courier_message_id {
        if let Some(courier) = order.courier_id.and_then(|id| state.courier(id)) {
            delete_message_quietly(state, settings, courier.chat_id, message_id, order_id).await;
        }
    }

    if let Some(message_id) = order.branch_message_id {
        delete_message_quietly(state, settings, settings.branch_chat_id, message_id, order_id).await;
    }

    let _ = state.orders.update(order_id, |o| {
        o.courier_message_id = None;
        o.branch_message_id = None;
    });
}
