//! Database models for campaigns.

use crate::types::{CampaignId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Physical sticker size with its fixed per-unit manufacturing price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StickerSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

impl StickerSize {
    /// Per-unit manufacturing price in dollars.
    pub fn unit_price(self) -> Decimal {
        match self {
            StickerSize::Small => Decimal::new(100, 2),      // $1.00
            StickerSize::Medium => Decimal::new(150, 2),     // $1.50
            StickerSize::Large => Decimal::new(200, 2),      // $2.00
            StickerSize::ExtraLarge => Decimal::new(250, 2), // $2.50
        }
    }
}

/// Database request for creating a new campaign
#[derive(Debug, Clone)]
pub struct CampaignCreateDBRequest {
    pub advertiser_id: UserId,
    pub title: String,
    pub description: String,
    /// Opaque reference to the sticker design in object storage
    pub sticker_design: String,
    pub sticker_size: StickerSize,
    /// Empty set means the campaign is available everywhere
    pub target_zip_codes: Vec<String>,
    /// Monthly per-driver payment in dollars
    pub monthly_payment: Decimal,
    pub max_stickers: i64,
    pub is_location_based: bool,
}

/// Database request for updating a campaign
#[derive(Debug, Clone, Default)]
pub struct CampaignUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub max_stickers: Option<i64>,
}

/// Database response for a campaign record
#[derive(Debug, Clone)]
pub struct CampaignDBResponse {
    pub id: CampaignId,
    pub advertiser_id: UserId,
    pub title: String,
    pub description: String,
    pub sticker_design: String,
    pub sticker_size: StickerSize,
    pub target_zip_codes: Vec<String>,
    pub monthly_payment: Decimal,
    pub max_stickers: i64,
    pub is_location_based: bool,
    pub is_active: bool,
    /// `max_stickers` minus the count of approved or completed applications
    pub remaining_capacity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_prices_match_the_price_sheet() {
        assert_eq!(StickerSize::Small.unit_price(), Decimal::new(100, 2));
        assert_eq!(StickerSize::Medium.unit_price(), Decimal::new(150, 2));
        assert_eq!(StickerSize::Large.unit_price(), Decimal::new(200, 2));
        assert_eq!(StickerSize::ExtraLarge.unit_price(), Decimal::new(250, 2));
    }
}
