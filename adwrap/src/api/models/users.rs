use crate::db::models::users::{Role, UserDBResponse};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for provisioning an account
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    pub email: String,
    #[serde(flatten)]
    pub role: Role,
    /// Driver zip codes for campaign eligibility; ignored for advertisers
    #[serde(default)]
    pub zip_codes: Vec<String>,
}

/// Request body for updating the caller's account
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub is_onboarded: Option<bool>,
    pub zip_codes: Option<Vec<String>>,
}

/// An account as returned by the API
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    #[serde(flatten)]
    pub role: Role,
    pub zip_codes: Vec<String>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(user: UserDBResponse) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            zip_codes: user.zip_codes,
            is_onboarded: user.is_onboarded,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
