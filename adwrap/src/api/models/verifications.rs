use crate::db::models::verifications::{VerificationDBResponse, VerificationStatus};
use crate::types::{CampaignId, UserId, VerificationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for submitting a verification photo
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerificationSubmitRequest {
    /// Reference to the uploaded photo; clients upload to object storage first
    pub photo_url: String,
}

/// Request body for reviewing a submitted photo
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VerificationReviewRequest {
    pub approve: bool,
}

/// A photo verification as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VerificationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: VerificationId,
    #[schema(value_type = String, format = "uuid")]
    pub driver_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub campaign_id: CampaignId,
    pub photo_url: String,
    pub status: VerificationStatus,
    pub submitted_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<VerificationDBResponse> for VerificationResponse {
    fn from(v: VerificationDBResponse) -> Self {
        Self {
            id: v.id,
            driver_id: v.driver_id,
            campaign_id: v.campaign_id,
            photo_url: v.photo_url,
            status: v.status,
            submitted_at: v.submitted_at,
            verified_at: v.verified_at,
        }
    }
}
