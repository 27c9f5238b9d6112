//! The webhook boundary: parses inbound chat-platform updates into a small
//! tagged union, authorizes the actor, and dispatches to the coordinator.
//!
//! Business rejections (wrong state, too far, nothing pending) acknowledge
//! with `200 {"ok": true, ...}` so the platform does not redeliver; `404`,
//! `403`, and `500` are reserved for missing resources, a non-assigned
//! actor, and internal failures.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use uuid::Uuid;

use crate::engine::{assignment, transition};
use crate::error::AppError;
use crate::models::courier::GeoPoint;
use crate::models::tenant::TenantSettings;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierAction {
    EnRoute,
    Complete,
    Cancel,
}

impl CourierAction {
    pub fn callback_data(self, order_id: Uuid) -> String {
        match self {
            CourierAction::EnRoute => format!("en_route_{order_id}"),
            CourierAction::Complete => format!("complete_order_{order_id}"),
            CourierAction::Cancel => format!("cancel_order_{order_id}"),
        }
    }

    /// Parses a button payload. `complete_<id>` is accepted alongside
    /// `complete_order_<id>` for older messages still live in chats.
    pub fn parse(data: &str) -> Option<(Self, Uuid)> {
        let (action, rest) = if let Some(rest) = data.strip_prefix("en_route_") {
            (CourierAction::EnRoute, rest)
        } else if let Some(rest) = data.strip_prefix("complete_order_") {
            (CourierAction::Complete, rest)
        } else if let Some(rest) = data.strip_prefix("cancel_order_") {
            (CourierAction::Cancel, rest)
        } else if let Some(rest) = data.strip_prefix("complete_") {
            (CourierAction::Complete, rest)
        } else {
            return None;
        };

        Uuid::parse_str(rest).ok().map(|order_id| (action, order_id))
    }

    fn label(self) -> &'static str {
        match self {
            CourierAction::EnRoute => "en_route",
            CourierAction::Complete => "complete",
            CourierAction::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Update {
    callback_query: Option<CallbackQuery>,
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: ChatUser,
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUser {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    from: Option<ChatUser>,
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

/// Recognized event kinds; everything else is acknowledged and dropped at
/// the boundary instead of being carried into the business logic.
pub enum WebhookEvent {
    Action {
        callback_id: String,
        actor_chat_id: i64,
        action: CourierAction,
        order_id: Uuid,
    },
    SharedLocation {
        actor_chat_id: i64,
        location: GeoPoint,
    },
    Unrecognized,
}

pub fn parse_update(update: &Update) -> WebhookEvent {
    if let Some(query) = &update.callback_query {
        if let Some((action, order_id)) =
            query.data.as_deref().and_then(CourierAction::parse)
        {
            return WebhookEvent::Action {
                callback_id: query.id.clone(),
                actor_chat_id: query.from.id,
                action,
                order_id,
            };
        }
        return WebhookEvent::Unrecognized;
    }

    if let Some(message) = &update.message {
        if let (Some(from), Some(location)) = (&message.from, &message.location) {
            return WebhookEvent::SharedLocation {
                actor_chat_id: from.id,
                location: GeoPoint {
                    lat: location.latitude,
                    lng: location.longitude,
                },
            };
        }
    }

    WebhookEvent::Unrecognized
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/:tenant_id", post(handle_webhook))
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<Uuid>,
    Json(update): Json<Update>,
) -> Result<Json<Value>, AppError> {
    let settings = state
        .tenant_settings(tenant_id)
        .ok_or_else(|| AppError::NotFound(format!("tenant {tenant_id} not registered")))?;

    match parse_update(&update) {
        WebhookEvent::Action {
            callback_id,
            actor_chat_id,
            action,
            order_id,
        } => handle_action(&state, &settings, &callback_id, actor_chat_id, action, order_id).await,
        WebhookEvent::SharedLocation {
            actor_chat_id,
            location,
        } => handle_location(&state, &settings, actor_chat_id, location).await,
        WebhookEvent::Unrecognized => {
            state
                .metrics
                .webhook_events_total
                .with_label_values(&["unrecognized", "ignored"])
                .inc();
            Ok(Json(json!({ "ok": true, "ignored": true })))
        }
    }
}

async fn answer_quietly(state: &AppState, settings: &TenantSettings, callback_id: &str, text: &str) {
    if let Err(err) = state
        .chat
        .answer_callback(&settings.bot_token, callback_id, text)
        .await
    {
        warn!(error = %err, "failed to answer callback query");
    }
}

async fn handle_action(
    state: &AppState,
    settings: &TenantSettings,
    callback_id: &str,
    actor_chat_id: i64,
    action: CourierAction,
    order_id: Uuid,
) -> Result<Json<Value>, AppError> {
    let result = dispatch_action(state, settings, actor_chat_id, action, order_id).await;

    let (alert, outcome, response) = match result {
        Ok(alert) => (alert, "success", Ok(Json(json!({ "ok": true })))),
        Err(AppError::PreconditionFailed(details)) => (
            details.clone(),
            "rejected",
            Ok(Json(json!({ "ok": true, "ignored": true, "details": details }))),
        ),
        Err(err) => {
            let (alert, outcome) = match &err {
                AppError::NotFound(_) => ("Order not found".to_string(), "not_found"),
                AppError::Unauthorized(_) => {
                    ("This order is not assigned to you".to_string(), "unauthorized")
                }
                _ => ("Something went wrong, try again".to_string(), "error"),
            };
            if let AppError::Internal(details) = &err {
                state.audit.record(
                    settings.tenant_id,
                    Some(order_id),
                    None,
                    format!("webhook action {} failed: {details}", action.label()),
                );
            }
            (alert, outcome, Err(err))
        }
    };

    answer_quietly(state, settings, callback_id, &alert).await;
    state
        .metrics
        .webhook_events_total
        .with_label_values(&[action.label(), outcome])
        .inc();

    response
}

async fn dispatch_action(
    state: &AppState,
    settings: &TenantSettings,
    actor_chat_id: i64,
    action: CourierAction,
    order_id: Uuid,
) -> Result<String, AppError> {
    let courier = state
        .courier_by_chat_id(settings.tenant_id, actor_chat_id)
        .ok_or_else(|| AppError::NotFound(format!("no courier with chat id {actor_chat_id}")))?;

    let order = state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.status.is_archived() {
        return Err(AppError::NotFound(format!("order {order_id} is archived")));
    }

    if order.courier_id != Some(courier.id) {
        return Err(AppError::Unauthorized(
            "order is held by another courier".to_string(),
        ));
    }

    match action {
        CourierAction::EnRoute => {
            transition::mark_en_route(state, order_id, courier.id).await?;
            Ok("On the way!".to_string())
        }
        CourierAction::Complete => {
            match transition::complete(state, order_id, courier.id).await? {
                transition::CompleteOutcome::Completed(order) => Ok(match order.payout {
                    Some(amount) => format!("Delivery completed. Payout: {amount}"),
                    None => "Delivery completed".to_string(),
                }),
                transition::CompleteOutcome::AwaitingLocation(_) => {
                    Ok("Share your location to confirm the delivery".to_string())
                }
            }
        }
        CourierAction::Cancel => {
            assignment::release(state, order_id, courier.id, "cancelled via chat").await?;
            Ok("Order returned to the pool".to_string())
        }
    }
}

async fn send_reply_quietly(
    state: &AppState,
    settings: &TenantSettings,
    chat_id: i64,
    text: &str,
) {
    if let Err(err) = state
        .chat
        .send_message(&settings.bot_token, chat_id, text, &[])
        .await
    {
        warn!(chat_id, error = %err, "failed to send reply");
    }
}

async fn handle_location(
    state: &AppState,
    settings: &TenantSettings,
    actor_chat_id: i64,
    location: GeoPoint,
) -> Result<Json<Value>, AppError> {
    let metric = |outcome: &str| {
        state
            .metrics
            .webhook_events_total
            .with_label_values(&["location", outcome])
            .inc();
    };

    let Some(courier) = state.courier_by_chat_id(settings.tenant_id, actor_chat_id) else {
        metric("ignored");
        return Ok(Json(json!({ "ok": true, "ignored": true })));
    };

    match transition::confirm_location(state, settings, &courier, location).await {
        Ok(transition::LocationOutcome::Completed(order)) => {
            let text = match order.payout {
                Some(amount) => format!("Delivery confirmed. Payout: {amount}"),
                None => "Delivery confirmed".to_string(),
            };
            send_reply_quietly(state, settings, courier.chat_id, &text).await;
            metric("success");
            Ok(Json(json!({ "ok": true })))
        }
        Ok(transition::LocationOutcome::OutsideRadius { distance_m, radius_m }) => {
            let text = format!(
                "You are {:.0} m from the delivery point; come within {:.0} m to confirm",
                distance_m, radius_m
            );
            send_reply_quietly(state, settings, courier.chat_id, &text).await;
            metric("too_far");
            Ok(Json(json!({ "ok": true, "too_far": true, "distance_m": distance_m })))
        }
        Ok(transition::LocationOutcome::NoPendingAction) => {
            metric("ignored");
            Ok(Json(json!({ "ok": true, "ignored": true })))
        }
        Err(AppError::PreconditionFailed(details)) => {
            send_reply_quietly(state, settings, courier.chat_id, &details).await;
            metric("rejected");
            Ok(Json(json!({ "ok": true, "ignored": true, "details": details })))
        }
        Err(err) => {
            if let AppError::Internal(details) = &err {
                state.audit.record(
                    settings.tenant_id,
                    None,
                    Some(courier.id),
                    format!("location confirmation failed: {details}"),
                );
            }
            metric("error");
            Err(err)
        }
    }
}
