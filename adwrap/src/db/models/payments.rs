//! Database models for ledger payments.

use crate::types::{ApplicationId, PaymentId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a payment is for. Wire names match the mobile clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Hash, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Fixed monthly platform fee charged to the advertiser
    MonthlyFee,
    /// One-off per-sticker charge
    StickerFee,
    /// Monthly payout to the driver
    DriverPayment,
    /// Sticker manufacturing charge (unit price x sticker count)
    ManufacturingFee,
}

/// Settlement state.
///
/// Lifecycle: pending -> processing -> completed|failed; failed may retry back
/// to pending (bounded by the retry policy); completed may move to refunded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// Database request for recording a new payment
#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub user_id: UserId,
    /// Ledger provenance: the application this charge belongs to, if any
    pub application_id: Option<ApplicationId>,
    /// Ledger provenance: the verification cycle this charge belongs to, if any
    pub cycle_index: Option<i64>,
    pub payment_type: PaymentType,
    pub amount: Decimal,
    pub description: String,
}

/// Database response for a payment record
#[derive(Debug, Clone)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub user_id: UserId,
    pub application_id: Option<ApplicationId>,
    pub cycle_index: Option<i64>,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub description: String,
    pub processor_ref: Option<String>,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}
