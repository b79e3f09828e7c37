use crate::AppState;
use crate::api::models::{UserCreateRequest, UserResponse, UserUpdateRequest};
use crate::auth::CurrentUser;
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{Role, UserCreateDBRequest, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

/// Provision an account.
///
/// Called once by the identity proxy after a successful signup; there is no
/// self-service registration beyond it. Role is fixed at creation.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = UserCreateRequest,
    responses(
        (status = CREATED, description = "Account created", body = UserResponse),
        (status = BAD_REQUEST, description = "Invalid account details"),
        (status = CONFLICT, description = "Email already registered"),
    )
)]
#[tracing::instrument(skip(state, request), fields(email = %request.email))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<UserCreateRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if request.email.trim().is_empty() || !request.email.contains('@') {
        return Err(Error::Validation {
            message: "email must be a valid address".to_string(),
        });
    }
    match &request.role {
        Role::Advertiser { company_name } if company_name.trim().is_empty() => {
            return Err(Error::Validation {
                message: "company_name must not be empty".to_string(),
            });
        }
        Role::Driver { full_name } if full_name.trim().is_empty() => {
            return Err(Error::Validation {
                message: "full_name must not be empty".to_string(),
            });
        }
        _ => {}
    }

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: request.email,
            role: request.role,
            zip_codes: request.zip_codes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Fetch the calling user's account.
#[utoipa::path(
    get,
    path = "/users/current",
    tag = "users",
    responses(
        (status = OK, description = "The caller's account", body = UserResponse),
        (status = UNAUTHORIZED, description = "Missing or unknown identity"),
    )
)]
pub async fn get_current_user(current_user: CurrentUser) -> Json<UserResponse> {
    Json(current_user.0.into())
}

/// Update the calling user's account.
#[utoipa::path(
    patch,
    path = "/users/current",
    tag = "users",
    request_body = UserUpdateRequest,
    responses(
        (status = OK, description = "Updated account", body = UserResponse),
        (status = UNAUTHORIZED, description = "Missing or unknown identity"),
    )
)]
#[tracing::instrument(skip(state, current_user, request), fields(user_id = %current_user.0.id))]
pub async fn update_current_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn)
        .update(
            current_user.0.id,
            &UserUpdateDBRequest {
                is_onboarded: request.is_onboarded,
                zip_codes: request.zip_codes,
            },
        )
        .await?;

    Ok(Json(user.into()))
}
