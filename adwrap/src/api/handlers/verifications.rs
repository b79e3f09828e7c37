use crate::AppState;
use crate::api::handlers::campaigns::owned_campaign;
use crate::api::models::{VerificationResponse, VerificationReviewRequest, VerificationSubmitRequest};
use crate::auth::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::Verifications;
use crate::db::handlers::verifications::VerificationFilter;
use crate::db::models::verifications::{VerificationCreateDBRequest, VerificationStatus};
use crate::errors::{Error, Result};
use crate::types::{CampaignId, VerificationId};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use utoipa::IntoParams;

/// Query parameters for listing verifications
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct VerificationListParams {
    /// Restrict to one campaign (required for advertisers)
    #[param(value_type = String, format = "uuid")]
    pub campaign_id: Option<CampaignId>,
    pub status: Option<VerificationStatus>,
}

/// Submit this cycle's verification photo for a campaign.
#[utoipa::path(
    post,
    path = "/campaigns/{id}/verifications",
    tag = "verifications",
    params(("id" = uuid::Uuid, Path, description = "Campaign id")),
    request_body = VerificationSubmitRequest,
    responses(
        (status = CREATED, description = "Photo submitted for review", body = VerificationResponse),
        (status = BAD_REQUEST, description = "No approved application for this campaign"),
        (status = FORBIDDEN, description = "Caller is not a driver"),
        (status = CONFLICT, description = "A submission is already awaiting review"),
    )
)]
#[tracing::instrument(skip(state, current_user, request), fields(driver_id = %current_user.0.id, campaign_id = %campaign_id))]
pub async fn submit_verification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(campaign_id): Path<CampaignId>,
    Json(request): Json<VerificationSubmitRequest>,
) -> Result<(StatusCode, Json<VerificationResponse>)> {
    current_user.require_driver()?;

    if request.photo_url.trim().is_empty() {
        return Err(Error::Validation {
            message: "photo_url must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let verification = Verifications::new(&mut conn)
        .submit(&VerificationCreateDBRequest {
            driver_id: current_user.0.id,
            campaign_id,
            photo_url: request.photo_url,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(verification.into())))
}

/// List verifications visible to the caller.
///
/// Drivers see their own submissions; advertisers see submissions for a
/// campaign they own, selected with `campaign_id`.
#[utoipa::path(
    get,
    path = "/verifications",
    tag = "verifications",
    params(VerificationListParams),
    responses(
        (status = OK, description = "Verifications", body = Vec<VerificationResponse>),
        (status = FORBIDDEN, description = "Caller cannot see these verifications"),
    )
)]
pub async fn list_verifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<VerificationListParams>,
) -> Result<Json<Vec<VerificationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let filter = if current_user.0.role.is_driver() {
        VerificationFilter {
            driver_id: Some(current_user.0.id),
            campaign_id: params.campaign_id,
            status: params.status,
        }
    } else {
        let campaign_id = params.campaign_id.ok_or_else(|| Error::Validation {
            message: "campaign_id is required when listing as an advertiser".to_string(),
        })?;
        owned_campaign(&mut conn, campaign_id, &current_user).await?;
        VerificationFilter {
            driver_id: None,
            campaign_id: Some(campaign_id),
            status: params.status,
        }
    };

    let verifications = Verifications::new(&mut conn).list(&filter).await?;
    Ok(Json(verifications.into_iter().map(VerificationResponse::from).collect()))
}

/// Review a pending photo submission.
#[utoipa::path(
    post,
    path = "/verifications/{id}/review",
    tag = "verifications",
    params(("id" = uuid::Uuid, Path, description = "Verification id")),
    request_body = VerificationReviewRequest,
    responses(
        (status = OK, description = "Review recorded", body = VerificationResponse),
        (status = FORBIDDEN, description = "Caller does not own the campaign"),
        (status = NOT_FOUND, description = "No such verification"),
        (status = CONFLICT, description = "Submission already reviewed"),
    )
)]
#[tracing::instrument(skip(state, current_user, request), fields(verification_id = %id))]
pub async fn review_verification(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<VerificationId>,
    Json(request): Json<VerificationReviewRequest>,
) -> Result<Json<VerificationResponse>> {
    current_user.require_advertiser()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let verification = Verifications::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Verification".to_string(),
            id: id.to_string(),
        })?;
    owned_campaign(&mut conn, verification.campaign_id, &current_user).await?;

    let verification = Verifications::new(&mut conn).review(id, request.approve).await?;
    Ok(Json(verification.into()))
}
