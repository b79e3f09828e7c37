use crate::AppState;
use crate::api::models::{CampaignCreateRequest, CampaignResponse, CampaignUpdateRequest, Pagination};
use crate::auth::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::campaigns::CampaignFilter;
use crate::db::handlers::{Campaigns, Repository};
use crate::db::models::campaigns::{CampaignCreateDBRequest, CampaignDBResponse, CampaignUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::CampaignId;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;

/// Create a campaign owned by the calling advertiser.
#[utoipa::path(
    post,
    path = "/campaigns",
    tag = "campaigns",
    request_body = CampaignCreateRequest,
    responses(
        (status = CREATED, description = "Campaign created", body = CampaignResponse),
        (status = BAD_REQUEST, description = "Invalid campaign details"),
        (status = FORBIDDEN, description = "Caller is not an advertiser"),
    )
)]
#[tracing::instrument(skip(state, current_user, request), fields(advertiser_id = %current_user.0.id))]
pub async fn create_campaign(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CampaignCreateRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>)> {
    current_user.require_advertiser()?;

    if request.max_stickers < 1 {
        return Err(Error::Validation {
            message: "max_stickers must be at least 1".to_string(),
        });
    }
    if request.monthly_payment <= Decimal::ZERO {
        return Err(Error::Validation {
            message: "monthly_payment must be positive".to_string(),
        });
    }
    if request.title.trim().is_empty() {
        return Err(Error::Validation {
            message: "title must not be empty".to_string(),
        });
    }
    if !request.target_zip_codes.is_empty() && !request.is_location_based {
        return Err(Error::Validation {
            message: "a campaign with target_zip_codes must set is_location_based".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let campaign = Campaigns::new(&mut conn)
        .create(&CampaignCreateDBRequest {
            advertiser_id: current_user.0.id,
            title: request.title,
            description: request.description,
            sticker_design: request.sticker_design,
            sticker_size: request.sticker_size,
            target_zip_codes: request.target_zip_codes,
            monthly_payment: request.monthly_payment,
            max_stickers: request.max_stickers,
            is_location_based: request.is_location_based,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(campaign.into())))
}

/// List the calling advertiser's campaigns.
#[utoipa::path(
    get,
    path = "/campaigns",
    tag = "campaigns",
    params(Pagination),
    responses(
        (status = OK, description = "The caller's campaigns", body = Vec<CampaignResponse>),
        (status = FORBIDDEN, description = "Caller is not an advertiser"),
    )
)]
pub async fn list_campaigns(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<CampaignResponse>>> {
    current_user.require_advertiser()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let campaigns = Campaigns::new(&mut conn)
        .list(&CampaignFilter::new(
            Some(current_user.0.id),
            pagination.skip,
            pagination.limit,
        ))
        .await?;

    Ok(Json(campaigns.into_iter().map(CampaignResponse::from).collect()))
}

/// List campaigns the calling driver may apply to.
///
/// A campaign qualifies when it is active, has sticker slots left, and
/// either targets no zip codes or overlaps the driver's zip set.
#[utoipa::path(
    get,
    path = "/campaigns/available",
    tag = "campaigns",
    responses(
        (status = OK, description = "Campaigns open to the caller", body = Vec<CampaignResponse>),
        (status = FORBIDDEN, description = "Caller is not a driver"),
    )
)]
pub async fn list_available_campaigns(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<Vec<CampaignResponse>>> {
    current_user.require_driver()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let campaigns = Campaigns::new(&mut conn)
        .list_available(&current_user.0.zip_codes)
        .await?;

    Ok(Json(campaigns.into_iter().map(CampaignResponse::from).collect()))
}

/// Fetch one campaign.
#[utoipa::path(
    get,
    path = "/campaigns/{id}",
    tag = "campaigns",
    params(("id" = uuid::Uuid, Path, description = "Campaign id")),
    responses(
        (status = OK, description = "The campaign", body = CampaignResponse),
        (status = NOT_FOUND, description = "No such campaign"),
    )
)]
pub async fn get_campaign(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<CampaignId>,
) -> Result<Json<CampaignResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let campaign = Campaigns::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Campaign".to_string(),
            id: id.to_string(),
        })?;

    Ok(Json(campaign.into()))
}

/// Update a campaign. Only the owning advertiser may do so.
#[utoipa::path(
    patch,
    path = "/campaigns/{id}",
    tag = "campaigns",
    params(("id" = uuid::Uuid, Path, description = "Campaign id")),
    request_body = CampaignUpdateRequest,
    responses(
        (status = OK, description = "Updated campaign", body = CampaignResponse),
        (status = FORBIDDEN, description = "Caller does not own the campaign"),
        (status = NOT_FOUND, description = "No such campaign"),
    )
)]
#[tracing::instrument(skip(state, current_user, request), fields(campaign_id = %id))]
pub async fn update_campaign(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(id): Path<CampaignId>,
    Json(request): Json<CampaignUpdateRequest>,
) -> Result<Json<CampaignResponse>> {
    current_user.require_advertiser()?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    owned_campaign(&mut conn, id, &current_user).await?;

    let campaign = Campaigns::new(&mut conn)
        .update(
            id,
            &CampaignUpdateDBRequest {
                title: request.title,
                description: request.description,
                is_active: request.is_active,
                max_stickers: request.max_stickers,
            },
        )
        .await?;

    Ok(Json(campaign.into()))
}

/// Fetch a campaign and verify the caller owns it.
pub(crate) async fn owned_campaign(
    conn: &mut SqliteConnection,
    id: CampaignId,
    current_user: &CurrentUser,
) -> Result<CampaignDBResponse> {
    let campaign = Campaigns::new(conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Campaign".to_string(),
            id: id.to_string(),
        })?;

    if campaign.advertiser_id != current_user.0.id {
        return Err(Error::Forbidden {
            required: "campaign owner",
        });
    }
    Ok(campaign)
}
