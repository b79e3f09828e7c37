use crate::billing::ledger::OverdueCycle;
use crate::db::models::payments::{PaymentDBResponse, PaymentStatus, PaymentType};
use crate::types::{ApplicationId, PaymentId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A payment record as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub application_id: Option<ApplicationId>,
    pub cycle_index: Option<i64>,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    #[schema(value_type = String, example = "46.50")]
    pub amount: Decimal,
    pub description: String,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<PaymentDBResponse> for PaymentResponse {
    fn from(payment: PaymentDBResponse) -> Self {
        Self {
            id: payment.id,
            user_id: payment.user_id,
            application_id: payment.application_id,
            cycle_index: payment.cycle_index,
            payment_type: payment.payment_type,
            status: payment.status,
            amount: payment.amount,
            description: payment.description,
            attempts: payment.attempts,
            created_at: payment.created_at,
            processed_at: payment.processed_at,
        }
    }
}

/// Settlement outcome reported by the processor's webhook
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SettlementOutcome {
    Succeeded,
    Failed,
}

/// Webhook payload from the payment processor
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SettlementCallback {
    /// The reference returned when the intent was created
    pub processor_ref: String,
    pub status: SettlementOutcome,
}

/// Request body for triggering a billing run
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct BillingRunRequest {
    /// Evaluate cycles as of this instant; defaults to now
    pub as_of: Option<DateTime<Utc>>,
}

/// Outcome of a billing run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BillingRunResponse {
    pub cycles_processed: u64,
    pub charges_created: u64,
    pub submitted: u64,
    pub settled: u64,
    pub overdue: Vec<OverdueCycle>,
}
