use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub async fn enqueue_broadcast(state: &AppState, order_id: Uuid) -> Result<(), AppError> {
    state
        .broadcast_tx
        .send(order_id)
        .await
        .map_err(|err| AppError::Internal(format!("broadcast queue send failed: {err}")))?;

    state.metrics.orders_awaiting_broadcast.inc();
    Ok(())
}
