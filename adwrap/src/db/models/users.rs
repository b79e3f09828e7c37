//! Database models for advertiser and driver accounts.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account role, a closed variant carrying the role-specific profile field.
///
/// Advertisers commission campaigns under a company name; drivers display
/// stickers under their legal name and carry the zip codes used for
/// campaign eligibility.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Role {
    Advertiser { company_name: String },
    Driver { full_name: String },
}

impl Role {
    /// Wire name as stored in the `role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Advertiser { .. } => "advertiser",
            Role::Driver { .. } => "driver",
        }
    }

    pub fn is_advertiser(&self) -> bool {
        matches!(self, Role::Advertiser { .. })
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, Role::Driver { .. })
    }
}

/// Database request for provisioning a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub role: Role,
    /// Driver zip codes for eligibility matching; ignored for advertisers
    pub zip_codes: Vec<String>,
}

/// Database request for the mutable slice of a user record.
///
/// Identity is immutable once created; only the onboarding flag and the
/// driver zip set (plus `updated_at`) ever change.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub is_onboarded: Option<bool>,
    pub zip_codes: Option<Vec<String>>,
}

/// Database response for a user record
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub zip_codes: Vec<String>,
    pub is_onboarded: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
