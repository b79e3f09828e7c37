use crate::AppState;
use crate::db::errors::DbError;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserDBResponse;
use crate::errors::Error;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

/// The authenticated caller, resolved from the trusted identity header.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserDBResponse);

impl CurrentUser {
    /// Require the caller to be an advertiser.
    pub fn require_advertiser(&self) -> Result<(), Error> {
        if self.0.role.is_advertiser() {
            Ok(())
        } else {
            Err(Error::Forbidden {
                required: "advertiser",
            })
        }
    }

    /// Require the caller to be a driver.
    pub fn require_driver(&self) -> Result<(), Error> {
        if self.0.role.is_driver() {
            Ok(())
        } else {
            Err(Error::Forbidden { required: "driver" })
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header_name = &state.config.auth.user_header;
        let raw = parts
            .headers
            .get(header_name)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| Error::Unauthenticated {
                message: Some(format!("missing {header_name} header")),
            })?;

        let user_id: Uuid = raw.parse().map_err(|_| Error::Unauthenticated {
            message: Some(format!("malformed user id in {header_name} header")),
        })?;

        let mut conn = state.db.acquire().await.map_err(DbError::from)?;
        let user = Users::new(&mut conn)
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| Error::Unauthenticated {
                message: Some("unknown user".to_string()),
            })?;

        Ok(CurrentUser(user))
    }
}
