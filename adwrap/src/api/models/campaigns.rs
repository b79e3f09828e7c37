use crate::db::models::campaigns::{CampaignDBResponse, StickerSize};
use crate::types::{CampaignId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for creating a campaign
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CampaignCreateRequest {
    pub title: String,
    pub description: String,
    /// Reference to the sticker design asset
    pub sticker_design: String,
    pub sticker_size: StickerSize,
    /// Zip codes the campaign targets; empty or omitted means everywhere
    #[serde(default)]
    pub target_zip_codes: Vec<String>,
    /// Monthly per-driver payment in dollars
    #[schema(value_type = String, example = "35.00")]
    pub monthly_payment: Decimal,
    pub max_stickers: i64,
    #[serde(default)]
    pub is_location_based: bool,
}

/// Request body for updating a campaign; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CampaignUpdateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub max_stickers: Option<i64>,
}

/// A campaign as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CampaignResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CampaignId,
    #[schema(value_type = String, format = "uuid")]
    pub advertiser_id: UserId,
    pub title: String,
    pub description: String,
    pub sticker_design: String,
    pub sticker_size: StickerSize,
    pub target_zip_codes: Vec<String>,
    #[schema(value_type = String, example = "35.00")]
    pub monthly_payment: Decimal,
    pub max_stickers: i64,
    pub is_location_based: bool,
    pub is_active: bool,
    /// Sticker slots not yet committed to an approved or completed
    /// application
    pub remaining_capacity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CampaignDBResponse> for CampaignResponse {
    fn from(campaign: CampaignDBResponse) -> Self {
        Self {
            id: campaign.id,
            advertiser_id: campaign.advertiser_id,
            title: campaign.title,
            description: campaign.description,
            sticker_design: campaign.sticker_design,
            sticker_size: campaign.sticker_size,
            target_zip_codes: campaign.target_zip_codes,
            monthly_payment: campaign.monthly_payment,
            max_stickers: campaign.max_stickers,
            is_location_based: campaign.is_location_based,
            is_active: campaign.is_active,
            remaining_capacity: campaign.remaining_capacity,
            created_at: campaign.created_at,
            updated_at: campaign.updated_at,
        }
    }
}
