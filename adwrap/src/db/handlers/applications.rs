use crate::db::{
    errors::DbError,
    models::applications::{
        ApplicationCreateDBRequest, ApplicationDBResponse, ApplicationStatus, BankAccountDetails,
    },
};
use crate::errors::{ConflictError, Error, Result};
use crate::types::{ApplicationId, CampaignId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

/// Filter for listing applications
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub driver_id: Option<UserId>,
    pub campaign_id: Option<CampaignId>,
    pub status: Option<ApplicationStatus>,
}

// Database entity model for an application row
#[derive(Debug, Clone, FromRow)]
struct ApplicationRow {
    id: Uuid,
    driver_id: Uuid,
    campaign_id: Uuid,
    status: ApplicationStatus,
    applied_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
    approved_at: Option<DateTime<Utc>>,
    delivery_address: String,
    bank_account_number: String,
    bank_routing_number: String,
    bank_account_holder: String,
    bank_name: String,
}

impl From<ApplicationRow> for ApplicationDBResponse {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            driver_id: row.driver_id,
            campaign_id: row.campaign_id,
            status: row.status,
            applied_at: row.applied_at,
            reviewed_at: row.reviewed_at,
            approved_at: row.approved_at,
            delivery_address: row.delivery_address,
            bank_account: BankAccountDetails {
                account_number: row.bank_account_number,
                routing_number: row.bank_routing_number,
                account_holder_name: row.bank_account_holder,
                bank_name: row.bank_name,
            },
        }
    }
}

/// Application lifecycle: pending -> approved -> completed, with rejection
/// terminal from any non-terminal state. Every transition is a single atomic
/// UPDATE guarded on the prior state, so a partially applied transition is
/// never observable.
pub struct Applications<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Applications<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Submit a driver's application to a campaign.
    ///
    /// Fails with [`ConflictError::DuplicateApplication`] when a non-rejected
    /// application already exists for the (driver, campaign) pair. The
    /// invariant is enforced by a partial unique index, so concurrent
    /// submissions cannot both succeed.
    pub async fn create(&mut self, request: &ApplicationCreateDBRequest) -> Result<ApplicationDBResponse> {
        let campaign_exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM campaigns WHERE id = ?")
            .bind(request.campaign_id)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;
        if campaign_exists.is_none() {
            return Err(Error::NotFound {
                resource: "Campaign".to_string(),
                id: request.campaign_id.to_string(),
            });
        }

        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO applications (
                id, driver_id, campaign_id, status, applied_at, delivery_address,
                bank_account_number, bank_routing_number, bank_account_holder, bank_name
            )
            VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(request.driver_id)
        .bind(request.campaign_id)
        .bind(Utc::now())
        .bind(&request.delivery_address)
        .bind(&request.bank_account.account_number)
        .bind(&request.bank_account.routing_number)
        .bind(&request.bank_account.account_holder_name)
        .bind(&request.bank_account.bank_name)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from);

        match result {
            Ok(_) => self.get_expect(id).await,
            Err(db_err) if db_err.unique_violation_on("applications.driver_id") => {
                Err(ConflictError::DuplicateApplication {
                    driver_id: request.driver_id,
                    campaign_id: request.campaign_id,
                }
                .into())
            }
            Err(db_err) => Err(db_err.into()),
        }
    }

    pub async fn get_by_id(&mut self, id: ApplicationId) -> Result<Option<ApplicationDBResponse>> {
        let row = sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(row.map(ApplicationDBResponse::from))
    }

    pub async fn list(&mut self, filter: &ApplicationFilter) -> Result<Vec<ApplicationDBResponse>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE (?1 IS NULL OR driver_id = ?1)
              AND (?2 IS NULL OR campaign_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY applied_at DESC
            "#,
        )
        .bind(filter.driver_id)
        .bind(filter.campaign_id)
        .bind(filter.status)
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(ApplicationDBResponse::from).collect())
    }

    /// Approve a pending application.
    ///
    /// Capacity is re-checked at approval time, not only at application time:
    /// the UPDATE is a compare-and-set counting already-approved (and
    /// completed) applications against the campaign's `max_stickers`, so two
    /// concurrent approvals for the last slot cannot both succeed. A pending
    /// application does not count against its own approval slot.
    pub async fn approve(&mut self, id: ApplicationId) -> Result<ApplicationDBResponse> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = 'approved', approved_at = ?1, reviewed_at = ?1
            WHERE id = ?2
              AND status = 'pending'
              AND (
                  SELECT COUNT(*) FROM applications a
                  WHERE a.campaign_id = applications.campaign_id
                    AND a.status IN ('approved', 'completed')
              ) < (SELECT c.max_stickers FROM campaigns c WHERE c.id = applications.campaign_id)
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }

        // The CAS did not fire; figure out which precondition failed.
        let app = self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Application".to_string(),
            id: id.to_string(),
        })?;

        match app.status {
            ApplicationStatus::Pending => Err(ConflictError::CapacityExceeded {
                campaign_id: app.campaign_id,
            }
            .into()),
            other => Err(self.invalid_transition(id, other, ApplicationStatus::Approved)),
        }
    }

    /// Reject an application. Allowed from any non-terminal state; terminal.
    pub async fn reject(&mut self, id: ApplicationId) -> Result<ApplicationDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = 'rejected', reviewed_at = ?
            WHERE id = ? AND status IN ('pending', 'approved')
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }
        self.transition_failure(id, ApplicationStatus::Rejected).await
    }

    /// Complete an application at the end of its campaign engagement.
    /// Requires prior state `approved`; no state is skipped.
    pub async fn complete(&mut self, id: ApplicationId) -> Result<ApplicationDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = 'completed'
            WHERE id = ? AND status = 'approved'
            "#,
        )
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }
        self.transition_failure(id, ApplicationStatus::Completed).await
    }

    async fn get_expect(&mut self, id: ApplicationId) -> Result<ApplicationDBResponse> {
        self.get_by_id(id).await?.ok_or_else(|| {
            Error::Other(anyhow::anyhow!("application {id} vanished mid-operation"))
        })
    }

    async fn transition_failure(&mut self, id: ApplicationId, to: ApplicationStatus) -> Result<ApplicationDBResponse> {
        let app = self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Application".to_string(),
            id: id.to_string(),
        })?;
        Err(self.invalid_transition(id, app.status, to))
    }

    fn invalid_transition(&self, id: ApplicationId, from: ApplicationStatus, to: ApplicationStatus) -> Error {
        ConflictError::InvalidTransition {
            entity: "application",
            id: id.to_string(),
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }
        .into()
    }
}
