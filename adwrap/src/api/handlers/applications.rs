use crate::AppState;
use crate::api::handlers::campaigns::owned_campaign;
use crate::api::models::{ApplicationCreateRequest, ApplicationResponse};
use crate::auth::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::Applications;
use crate::db::handlers::applications::ApplicationFilter;
use crate::db::models::applications::{ApplicationCreateDBRequest, ApplicationDBResponse, ApplicationStatus};
use crate::errors::{Error, Result};
use crate::types::{ApplicationId, CampaignId};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use sqlx::SqliteConnection;
use utoipa::IntoParams;

/// Query parameters for listing applications
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ApplicationListParams {
    /// Restrict to one campaign (required for advertisers)
    #[param(value_type = String, format = "uuid")]
    pub campaign_id: Option<CampaignId>,
    pub status: Option<ApplicationStatus>,
}

/// Apply to a campaign as the calling driver.
#[utoipa::path(
    post,
    path = "/campaigns/{id}/applications",
    tag = "applications",
    params(("id" = uuid::Uuid, Path, description = "Campaign id")),
    request_body = ApplicationCreateRequest,
    responses(
        (status = CREATED, description = "Application submitted", body = ApplicationResponse),
        (status = FORBIDDEN, description = "Caller is not a driver"),
        (status = NOT_FOUND, description = "No such campaign"),
        (status = CONFLICT, description = "An application for this campaign already exists"),
    )
)]
#[tracing::instrument(skip(state, current_user, request), fields(driver_id = %current_user.0.id, campaign_id = %campaign_id))]
pub async fn create_application(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(campaign_id): Path<CampaignId>,
    Json(request): Json<ApplicationCreateRequest>,
) -> Result<(StatusCode, Json<ApplicationResponse>)> {
    current_user.require_driver()?;

    if request.delivery_address.trim().is_empty() {
        return Err(Error::Validation {
            message: "delivery_address must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let application = Applications::new(&mut conn)
        .create(&ApplicationCreateDBRequest {
            driver_id: current_user.0.id,
            campaign_id,
            delivery_address: request.delivery_address,
            bank_account: request.bank_account,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(application.into())))
}

/// List applications visible to the caller.
///
/// Drivers see their own applications; advertisers see applications to a
/// campaign they own, selected with `campaign_id`.
#[utoipa::path(
    get,
    path = "/applications",
    tag = "applications",
    params(ApplicationListParams),
    responses(
        (status = OK, description = "Applications", body = Vec<ApplicationResponse>),
        (status = FORBIDDEN, description = "Caller cannot see these applications"),
    )
)]
pub async fn list_applications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(params): Query<ApplicationListParams>,
) -> Result<Json<Vec<ApplicationResponse>>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let filter = if current_user.0.role.is_driver() {
        ApplicationFilter {
            driver_id: Some(current_user.0.id),
            campaign_id: params.campaign_id,
            status: params.status,
        }
    } else {
        let campaign_id = params.campaign_id.ok_or_else(|| Error::Validation {
            message: "campaign_id is required when listing as an advertiser".to_string(),
        })?;
        owned_campaign(&mut conn, campaign_id, &current_user).await?;
        ApplicationFilter {
            driver_id: None,
            campaign_id: Some(campaign_id),
            status: params.status,
        }
    };

    let applications = Applications::new(&mut conn).list(&filter).await?;
    Ok(Json(applications.into_iter().map(ApplicationResponse::from).collect()))
}

/// Approve a pending application.
#[utoipa::path(
    post,
    path = "/applications/{id}/approve",
    tag = "applications",
    params(("id" = uuid::Uuid, Path, description = "Application id")),
    responses(
        (status = OK, description = "Application approved", body = ApplicationResponse),
        (status = FORBIDDEN, description = "Caller does not own the campaign"),
        (status = NOT_FOUND, description = "No such application"),
        (status = CONFLICT, description = "Campaign is full or the application is not pending"),
    )
)]
#[tracing::instrument(skip(state, current_user), fields(application_id = %id))]
pub async fn approve_application(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ApplicationId>,
) -> Result<Json<ApplicationResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    reviewable_application(&mut conn, id, &current_user).await?;

    let application = Applications::new(&mut conn).approve(id).await?;
    Ok(Json(application.into()))
}

/// Reject an application.
#[utoipa::path(
    post,
    path = "/applications/{id}/reject",
    tag = "applications",
    params(("id" = uuid::Uuid, Path, description = "Application id")),
    responses(
        (status = OK, description = "Application rejected", body = ApplicationResponse),
        (status = FORBIDDEN, description = "Caller does not own the campaign"),
        (status = NOT_FOUND, description = "No such application"),
        (status = CONFLICT, description = "Application is already settled"),
    )
)]
#[tracing::instrument(skip(state, current_user), fields(application_id = %id))]
pub async fn reject_application(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ApplicationId>,
) -> Result<Json<ApplicationResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    reviewable_application(&mut conn, id, &current_user).await?;

    let application = Applications::new(&mut conn).reject(id).await?;
    Ok(Json(application.into()))
}

/// Mark an approved application completed at the end of the engagement.
#[utoipa::path(
    post,
    path = "/applications/{id}/complete",
    tag = "applications",
    params(("id" = uuid::Uuid, Path, description = "Application id")),
    responses(
        (status = OK, description = "Application completed", body = ApplicationResponse),
        (status = FORBIDDEN, description = "Caller does not own the campaign"),
        (status = NOT_FOUND, description = "No such application"),
        (status = CONFLICT, description = "Application is not approved"),
    )
)]
#[tracing::instrument(skip(state, current_user), fields(application_id = %id))]
pub async fn complete_application(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<ApplicationId>,
) -> Result<Json<ApplicationResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    reviewable_application(&mut conn, id, &current_user).await?;

    let application = Applications::new(&mut conn).complete(id).await?;
    Ok(Json(application.into()))
}

/// Fetch an application and verify the caller owns its campaign.
async fn reviewable_application(
    conn: &mut SqliteConnection,
    id: ApplicationId,
    current_user: &CurrentUser,
) -> Result<ApplicationDBResponse> {
    current_user.require_advertiser()?;

    let application = Applications::new(conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Application".to_string(),
            id: id.to_string(),
        })?;

    owned_campaign(conn, application.campaign_id, current_user).await?;
    Ok(application)
}
