//! Database models for photo verifications.

use crate::types::{CampaignId, UserId, VerificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Verification review state; approved and rejected are terminal for the cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// Database request for submitting a compliance photo
#[derive(Debug, Clone)]
pub struct VerificationCreateDBRequest {
    pub driver_id: UserId,
    pub campaign_id: CampaignId,
    /// Opaque reference to the photo in object storage; raw bytes never land here
    pub photo_url: String,
}

/// Database response for a photo verification record
#[derive(Debug, Clone)]
pub struct VerificationDBResponse {
    pub id: VerificationId,
    pub driver_id: UserId,
    pub campaign_id: CampaignId,
    pub photo_url: String,
    pub status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}
