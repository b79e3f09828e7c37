use crate::db::{
    errors::DbError,
    models::verifications::{
        VerificationCreateDBRequest, VerificationDBResponse, VerificationStatus,
    },
};
use crate::errors::{ConflictError, Error, Result};
use crate::types::{CampaignId, UserId, VerificationId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

/// Filter for listing photo verifications
#[derive(Debug, Clone, Default)]
pub struct VerificationFilter {
    pub driver_id: Option<UserId>,
    pub campaign_id: Option<CampaignId>,
    pub status: Option<VerificationStatus>,
}

#[derive(Debug, Clone, FromRow)]
struct VerificationRow {
    id: Uuid,
    driver_id: Uuid,
    campaign_id: Uuid,
    photo_url: String,
    status: VerificationStatus,
    submitted_at: DateTime<Utc>,
    verified_at: Option<DateTime<Utc>>,
}

impl From<VerificationRow> for VerificationDBResponse {
    fn from(row: VerificationRow) -> Self {
        Self {
            id: row.id,
            driver_id: row.driver_id,
            campaign_id: row.campaign_id,
            photo_url: row.photo_url,
            status: row.status,
            submitted_at: row.submitted_at,
            verified_at: row.verified_at,
        }
    }
}

/// Photo verification submissions and their review outcomes.
///
/// A driver proves the sticker is still mounted by submitting a photo once
/// per billing cycle. At most one submission per (driver, campaign) may sit
/// in `pending` review at a time, enforced by a partial unique index.
pub struct Verifications<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Verifications<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Submit a verification photo. The driver must hold an approved
    /// application for the campaign; drivers whose engagement was rejected
    /// or never approved have nothing to verify.
    pub async fn submit(&mut self, request: &VerificationCreateDBRequest) -> Result<VerificationDBResponse> {
        let approved: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM applications
            WHERE driver_id = ? AND campaign_id = ? AND status = 'approved'
            "#,
        )
        .bind(request.driver_id)
        .bind(request.campaign_id)
        .fetch_optional(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if approved.is_none() {
            return Err(Error::Validation {
                message: "no approved application for this campaign".to_string(),
            });
        }

        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO photo_verifications (id, driver_id, campaign_id, photo_url, status, submitted_at)
            VALUES (?, ?, ?, ?, 'pending', ?)
            "#,
        )
        .bind(id)
        .bind(request.driver_id)
        .bind(request.campaign_id)
        .bind(&request.photo_url)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from);

        match result {
            Ok(_) => self.get_expect(id).await,
            Err(db_err) if db_err.unique_violation_on("photo_verifications.driver_id") => {
                Err(ConflictError::VerificationAlreadyPending {
                    driver_id: request.driver_id,
                    campaign_id: request.campaign_id,
                }
                .into())
            }
            Err(db_err) => Err(db_err.into()),
        }
    }

    /// Review a pending submission, approving or rejecting it. Review
    /// decisions are final; a rejected photo is answered by a fresh
    /// submission, not by re-reviewing the old one.
    pub async fn review(&mut self, id: VerificationId, approve: bool) -> Result<VerificationDBResponse> {
        let status = if approve {
            VerificationStatus::Approved
        } else {
            VerificationStatus::Rejected
        };

        let result = sqlx::query(
            r#"
            UPDATE photo_verifications
            SET status = ?, verified_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }

        let existing = self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Verification".to_string(),
            id: id.to_string(),
        })?;
        Err(ConflictError::InvalidTransition {
            entity: "verification",
            id: id.to_string(),
            from: existing.status.as_str().to_string(),
            to: status.as_str().to_string(),
        }
        .into())
    }

    pub async fn get_by_id(&mut self, id: VerificationId) -> Result<Option<VerificationDBResponse>> {
        let row = sqlx::query_as::<_, VerificationRow>("SELECT * FROM photo_verifications WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(row.map(VerificationDBResponse::from))
    }

    pub async fn list(&mut self, filter: &VerificationFilter) -> Result<Vec<VerificationDBResponse>> {
        let rows = sqlx::query_as::<_, VerificationRow>(
            r#"
            SELECT * FROM photo_verifications
            WHERE (?1 IS NULL OR driver_id = ?1)
              AND (?2 IS NULL OR campaign_id = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY submitted_at DESC
            "#,
        )
        .bind(filter.driver_id)
        .bind(filter.campaign_id)
        .bind(filter.status)
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(VerificationDBResponse::from).collect())
    }

    /// Whether the driver submitted a photo (in any review state) for the
    /// campaign within the half-open window `[start, end)`. Billing uses
    /// this to decide whether a cycle's verification obligation was met.
    pub async fn has_submission_in(
        &mut self,
        driver_id: UserId,
        campaign_id: CampaignId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT 1 FROM photo_verifications
            WHERE driver_id = ? AND campaign_id = ?
              AND status <> 'rejected'
              AND submitted_at >= ? AND submitted_at < ?
            LIMIT 1
            "#,
        )
        .bind(driver_id)
        .bind(campaign_id)
        .bind(start)
        .bind(end)
        .fetch_optional(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        Ok(found.is_some())
    }

    async fn get_expect(&mut self, id: VerificationId) -> Result<VerificationDBResponse> {
        self.get_by_id(id).await?.ok_or_else(|| {
            Error::Other(anyhow::anyhow!("verification {id} vanished mid-operation"))
        })
    }
}
