//! Database models for driver applications.

use crate::types::{ApplicationId, CampaignId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Application lifecycle state.
///
/// Transitions: pending -> approved -> completed; pending|approved -> rejected
/// (terminal). No transition skips a state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Completed => "completed",
        }
    }
}

/// Bank account details for driver payouts - a value object embedded in the
/// application, with no lifecycle of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BankAccountDetails {
    pub account_number: String,
    pub routing_number: String,
    pub account_holder_name: String,
    pub bank_name: String,
}

/// Database request for creating a new application
#[derive(Debug, Clone)]
pub struct ApplicationCreateDBRequest {
    pub driver_id: UserId,
    pub campaign_id: CampaignId,
    pub delivery_address: String,
    pub bank_account: BankAccountDetails,
}

/// Database response for an application record
#[derive(Debug, Clone)]
pub struct ApplicationDBResponse {
    pub id: ApplicationId,
    pub driver_id: UserId,
    pub campaign_id: CampaignId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub delivery_address: String,
    pub bank_account: BankAccountDetails,
}
