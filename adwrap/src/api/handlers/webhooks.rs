use crate::AppState;
use crate::api::models::{PaymentResponse, SettlementCallback, SettlementOutcome};
use crate::db::errors::DbError;
use crate::db::handlers::Payments;
use crate::db::models::payments::PaymentStatus;
use crate::errors::{Error, Result};
use axum::Json;
use axum::extract::State;

/// Settlement callback from the payment processor.
///
/// Delivered at-least-once: a redelivery for an already-settled payment is
/// acknowledged without changing anything.
#[utoipa::path(
    post,
    path = "/webhooks/payments",
    tag = "webhooks",
    request_body = SettlementCallback,
    responses(
        (status = OK, description = "Settlement recorded (or already recorded)", body = PaymentResponse),
        (status = NOT_FOUND, description = "Unknown processor reference"),
    )
)]
#[tracing::instrument(skip(state, callback), fields(processor_ref = %callback.processor_ref))]
pub async fn payment_settlement(
    State(state): State<AppState>,
    Json(callback): Json<SettlementCallback>,
) -> Result<Json<PaymentResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut payments = Payments::new(&mut conn);

    let payment = payments
        .find_by_processor_ref(&callback.processor_ref)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Payment".to_string(),
            id: callback.processor_ref.clone(),
        })?;

    let outcome = match callback.status {
        SettlementOutcome::Succeeded => PaymentStatus::Completed,
        SettlementOutcome::Failed => PaymentStatus::Failed,
    };

    // Redelivery of an outcome we already recorded is a no-op ack
    if payment.status == outcome {
        return Ok(Json(payment.into()));
    }

    let payment = payments.settle(payment.id, outcome).await?;
    Ok(Json(payment.into()))
}
