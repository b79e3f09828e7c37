use crate::db::models::applications::{ApplicationDBResponse, ApplicationStatus, BankAccountDetails};
use crate::types::{ApplicationId, CampaignId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for applying to a campaign
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ApplicationCreateRequest {
    /// Where the manufactured sticker should be shipped
    pub delivery_address: String,
    /// Payout account for the driver's monthly payments
    pub bank_account: BankAccountDetails,
}

/// An application as returned by the API.
///
/// Bank details are echoed back masked; only the last four digits of the
/// account number survive serialization.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApplicationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: ApplicationId,
    #[schema(value_type = String, format = "uuid")]
    pub driver_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub campaign_id: CampaignId,
    pub status: ApplicationStatus,
    pub applied_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub delivery_address: String,
    pub bank_name: String,
    pub account_last_four: String,
}

impl From<ApplicationDBResponse> for ApplicationResponse {
    fn from(app: ApplicationDBResponse) -> Self {
        let digits = app.bank_account.account_number;
        let last_four = if digits.len() > 4 {
            digits[digits.len() - 4..].to_string()
        } else {
            digits
        };

        Self {
            id: app.id,
            driver_id: app.driver_id,
            campaign_id: app.campaign_id,
            status: app.status,
            applied_at: app.applied_at,
            reviewed_at: app.reviewed_at,
            approved_at: app.approved_at,
            delivery_address: app.delivery_address,
            bank_name: app.bank_account.bank_name,
            account_last_four: last_four,
        }
    }
}
