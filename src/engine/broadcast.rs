use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::chat::lifecycle;
use crate::error::AppError;
use crate::models::order::OrderStatus;
use crate::state::AppState;

/// Drains the broadcast queue and fans each searching order out to its
/// candidates. Orders that were accepted while queued are skipped.
pub async fn run_broadcast_engine(state: Arc<AppState>, mut broadcast_rx: mpsc::Receiver<Uuid>) {
    info!("broadcast engine started");

    while let Some(order_id) = broadcast_rx.recv().await {
        state.metrics.orders_awaiting_broadcast.dec();

        let start = Instant::now();
        match process_broadcast(state.clone(), order_id).await {
            Ok(_) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .broadcast_latency_seconds
                    .with_label_values(&["success"])
                    .observe(elapsed);
            }
            Err(err) => {
                let elapsed = start.elapsed().as_secs_f64();
                state
                    .metrics
                    .broadcast_latency_seconds
                    .with_label_values(&["error"])
                    .observe(elapsed);
                error!(order_id = %order_id, error = %err, "failed to broadcast order");
            }
        }
    }

    warn!("broadcast engine stopped: queue channel closed");
}

async fn process_broadcast(state: Arc<AppState>, order_id: Uuid) -> Result<usize, AppError> {
    let order = state
        .orders
        .get(order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id} not found")))?;

    if order.status != OrderStatus::Searching {
        info!(order_id = %order_id, status = ?order.status, "skipping broadcast; order left searching");
        return Ok(0);
    }

    let settings = state.tenant_settings(order.tenant_id).ok_or_else(|| {
        AppError::Internal(format!("no settings for tenant {}", order.tenant_id))
    })?;

    let offered = lifecycle::broadcast_order(&state, &settings, &order).await;

    info!(order_id = %order_id, offered, "order broadcast to candidates");
    Ok(offered)
}
