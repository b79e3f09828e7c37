//! OpenAPI documentation, served interactively at `/docs`.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::{
    ApplicationCreateRequest, ApplicationResponse, BillingRunRequest, BillingRunResponse,
    CampaignCreateRequest, CampaignResponse, CampaignUpdateRequest, PaymentResponse,
    SettlementCallback, SettlementOutcome, UserCreateRequest, UserResponse, UserUpdateRequest,
    VerificationResponse, VerificationReviewRequest, VerificationSubmitRequest,
};
use crate::billing::ledger::OverdueCycle;
use crate::db::models::applications::{ApplicationStatus, BankAccountDetails};
use crate::db::models::campaigns::StickerSize;
use crate::db::models::payments::{PaymentStatus, PaymentType};
use crate::db::models::users::Role;
use crate::db::models::verifications::VerificationStatus;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "adwrap",
        description = "Vehicle sticker advertising marketplace: campaigns, driver applications, photo verification and billing",
    ),
    servers((url = "/api/v1")),
    paths(
        handlers::health,
        handlers::users::create_user,
        handlers::users::get_current_user,
        handlers::users::update_current_user,
        handlers::campaigns::create_campaign,
        handlers::campaigns::list_campaigns,
        handlers::campaigns::list_available_campaigns,
        handlers::campaigns::get_campaign,
        handlers::campaigns::update_campaign,
        handlers::applications::create_application,
        handlers::applications::list_applications,
        handlers::applications::approve_application,
        handlers::applications::reject_application,
        handlers::applications::complete_application,
        handlers::verifications::submit_verification,
        handlers::verifications::list_verifications,
        handlers::verifications::review_verification,
        handlers::payments::list_payments,
        handlers::payments::retry_payment,
        handlers::payments::run_billing,
        handlers::webhooks::payment_settlement,
    ),
    components(schemas(
        Role,
        UserCreateRequest,
        UserUpdateRequest,
        UserResponse,
        StickerSize,
        CampaignCreateRequest,
        CampaignUpdateRequest,
        CampaignResponse,
        ApplicationStatus,
        BankAccountDetails,
        ApplicationCreateRequest,
        ApplicationResponse,
        VerificationStatus,
        VerificationSubmitRequest,
        VerificationReviewRequest,
        VerificationResponse,
        PaymentType,
        PaymentStatus,
        PaymentResponse,
        SettlementOutcome,
        SettlementCallback,
        BillingRunRequest,
        BillingRunResponse,
        OverdueCycle,
    )),
    tags(
        (name = "users", description = "Account provisioning and profile"),
        (name = "campaigns", description = "Campaign management and driver eligibility"),
        (name = "applications", description = "Driver application lifecycle"),
        (name = "verifications", description = "Monthly sticker photo verification"),
        (name = "payments", description = "Payment history and billing runs"),
        (name = "webhooks", description = "Processor callbacks"),
        (name = "health", description = "Service probes"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_has_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/users",
            "/users/current",
            "/campaigns",
            "/campaigns/available",
            "/campaigns/{id}",
            "/campaigns/{id}/applications",
            "/campaigns/{id}/verifications",
            "/applications",
            "/applications/{id}/approve",
            "/applications/{id}/reject",
            "/applications/{id}/complete",
            "/verifications",
            "/verifications/{id}/review",
            "/payments",
            "/payments/{id}/retry",
            "/billing/run",
            "/webhooks/payments",
            "/health",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn id_fields_document_as_uuid_strings() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        for (schema, field) in [
            ("CampaignResponse", "id"),
            ("CampaignResponse", "advertiser_id"),
            ("ApplicationResponse", "driver_id"),
            ("VerificationResponse", "campaign_id"),
            ("PaymentResponse", "user_id"),
            ("UserResponse", "id"),
            ("OverdueCycle", "application_id"),
        ] {
            // Schemas with a `#[serde(flatten)]` field are emitted as an
            // `allOf` composition, so look for the property in the object
            // branches too, not just the top-level `properties`.
            let schema_value = &doc["components"]["schemas"][schema];
            let mut property = &schema_value["properties"][field];
            if property.is_null() {
                if let Some(branches) = schema_value["allOf"].as_array() {
                    for branch in branches {
                        if !branch["properties"][field].is_null() {
                            property = &branch["properties"][field];
                            break;
                        }
                    }
                }
            }
            assert_eq!(property["type"], "string", "{schema}.{field}");
            assert_eq!(property["format"], "uuid", "{schema}.{field}");
        }
    }
}
