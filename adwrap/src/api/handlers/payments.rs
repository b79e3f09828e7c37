use crate::AppState;
use crate::api::models::{BillingRunRequest, BillingRunResponse, PaymentResponse};
use crate::auth::CurrentUser;
use crate::billing::ledger;
use crate::db::errors::DbError;
use crate::db::handlers::Payments;
use crate::db::handlers::payments::PaymentFilter;
use crate::db::models::payments::{PaymentStatus, PaymentType};
use crate::errors::{Error, Result};
use crate::types::PaymentId;
use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for listing payments
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct PaymentListParams {
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
}

/// List the calling user's payment history, newest first.
#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    params(PaymentListParams),
    responses(
        (status = OK, description = "The caller's payments", body = Vec<PaymentResponse>),
        (status = UNAUTHORIZED, description = "Missing or unknown identity"),
    )
)]
pub async fn list_payments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<PaymentListParams>,
) -> Result<Json<Vec<PaymentResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let payments = Payments::new(&mut conn)
        .list(&PaymentFilter {
            user_id: Some(current_user.0.id),
            status: params.status,
            payment_type: params.payment_type,
        })
        .await?;

    Ok(Json(payments.into_iter().map(PaymentResponse::from).collect()))
}

/// Re-queue one of the caller's failed payments.
#[utoipa::path(
    post,
    path = "/payments/{id}/retry",
    tag = "payments",
    params(("id" = uuid::Uuid, Path, description = "Payment id")),
    responses(
        (status = OK, description = "Payment re-queued", body = PaymentResponse),
        (status = NOT_FOUND, description = "No such payment"),
        (status = CONFLICT, description = "Payment is not failed, or its retries are exhausted"),
    )
)]
#[tracing::instrument(skip(state, current_user), fields(payment_id = %id))]
pub async fn retry_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<PaymentId>,
) -> Result<Json<PaymentResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let mut payments = Payments::new(&mut conn);

    let payment = payments.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Payment".to_string(),
        id: id.to_string(),
    })?;
    if payment.user_id != current_user.0.id {
        // Do not reveal other users' payment ids
        return Err(Error::NotFound {
            resource: "Payment".to_string(),
            id: id.to_string(),
        });
    }

    let payment = payments.retry_failed(id, state.config.retry.max_attempts).await?;
    Ok(Json(payment.into()))
}

/// Run the billing pipeline: record due charges, submit them to the
/// processor, and reconcile settlements.
///
/// Unauthenticated by design; the endpoint is reached only from the internal
/// network, where the scheduler invokes it. Re-running is always safe.
#[utoipa::path(
    post,
    path = "/billing/run",
    tag = "payments",
    request_body = BillingRunRequest,
    responses((status = OK, description = "Billing run summary", body = BillingRunResponse))
)]
#[tracing::instrument(skip(state, request))]
pub async fn run_billing(
    State(state): State<AppState>,
    Json(request): Json<BillingRunRequest>,
) -> Result<Json<BillingRunResponse>> {
    let as_of = request.as_of.unwrap_or_else(Utc::now);

    let summary = ledger::run(&state.db, &state.config.billing, as_of).await?;
    let submitted = ledger::submit_pending(&state.db, state.processor.as_ref()).await?;
    let settled = ledger::reconcile(&state.db, state.processor.as_ref(), &state.config.retry).await?;

    Ok(Json(BillingRunResponse {
        cycles_processed: summary.cycles_processed,
        charges_created: summary.charges_created,
        submitted,
        settled,
        overdue: summary.overdue,
    }))
}
