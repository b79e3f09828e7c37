use crate::db::{
    errors::DbError,
    handlers::repository::Repository,
    models::users::{Role, UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::errors::{Error, Result};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub role: Option<&'static str>,
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(role: Option<&'static str>, skip: i64, limit: i64) -> Self {
        Self { role, skip, limit }
    }
}

// Database entity model for a user row
#[derive(Debug, Clone, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    role: String,
    company_name: Option<String>,
    full_name: Option<String>,
    zip_codes: Json<Vec<String>>,
    is_onboarded: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserDBResponse {
    type Error = DbError;

    fn try_from(row: UserRow) -> std::result::Result<Self, DbError> {
        let role = match row.role.as_str() {
            "advertiser" => Role::Advertiser {
                company_name: row.company_name.unwrap_or_default(),
            },
            "driver" => Role::Driver {
                full_name: row.full_name.unwrap_or_default(),
            },
            other => {
                return Err(DbError::Other(anyhow::anyhow!(
                    "unknown role {other:?} for user {}",
                    row.id
                )));
            }
        };

        Ok(UserDBResponse {
            id: row.id,
            email: row.email,
            role,
            zip_codes: row.zip_codes.0,
            is_onboarded: row.is_onboarded,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        row.map(|r| UserDBResponse::try_from(r).map_err(Error::from)).transpose()
    }
}

#[async_trait::async_trait]
impl Repository for Users<'_> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let (company_name, full_name) = match &request.role {
            Role::Advertiser { company_name } => (Some(company_name.as_str()), None),
            Role::Driver { full_name } => (None, Some(full_name.as_str())),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, email, role, company_name, full_name, zip_codes, is_onboarded, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&request.email)
        .bind(request.role.as_str())
        .bind(company_name)
        .bind(full_name)
        .bind(Json(&request.zip_codes))
        .bind(now)
        .bind(now)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        self.get_by_id(id).await?.ok_or_else(|| {
            Error::Other(anyhow::anyhow!("user {id} vanished immediately after insert"))
        })
    }

    async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        row.map(|r| UserDBResponse::try_from(r).map_err(Error::from)).transpose()
    }

    async fn list(&mut self, filter: &UserFilter) -> Result<Vec<UserDBResponse>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE (?1 IS NULL OR role = ?1)
            ORDER BY created_at DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(filter.role)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        rows.into_iter()
            .map(|r| UserDBResponse::try_from(r).map_err(Error::from))
            .collect()
    }

    /// Only the onboarding flag and the driver zip set are mutable; identity
    /// fields stay as created.
    async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_onboarded = COALESCE(?, is_onboarded),
                zip_codes = COALESCE(?, zip_codes),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(request.is_onboarded)
        .bind(request.zip_codes.as_ref().map(Json))
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                resource: "User".to_string(),
                id: id.to_string(),
            });
        }

        self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "User".to_string(),
            id: id.to_string(),
        })
    }

    async fn delete(&mut self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(result.rows_affected() > 0)
    }
}
