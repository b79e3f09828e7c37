use crate::db::{
    errors::DbError,
    models::{
        from_cents,
        payments::{PaymentCreateDBRequest, PaymentDBResponse, PaymentStatus, PaymentType},
        to_cents,
    },
};
use crate::errors::{ConflictError, Error, Result};
use crate::types::{PaymentId, UserId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

/// Filter for listing payments
#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub user_id: Option<UserId>,
    pub status: Option<PaymentStatus>,
    pub payment_type: Option<PaymentType>,
}

#[derive(Debug, Clone, FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    application_id: Option<Uuid>,
    cycle_index: Option<i64>,
    payment_type: PaymentType,
    status: PaymentStatus,
    amount_cents: i64,
    description: String,
    processor_ref: Option<String>,
    attempts: i64,
    created_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl From<PaymentRow> for PaymentDBResponse {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            application_id: row.application_id,
            cycle_index: row.cycle_index,
            payment_type: row.payment_type,
            status: row.status,
            amount: from_cents(row.amount_cents),
            description: row.description,
            processor_ref: row.processor_ref,
            attempts: row.attempts,
            created_at: row.created_at,
            processed_at: row.processed_at,
        }
    }
}

/// Payment records and their settlement lifecycle.
///
/// Settlement transitions mirror the application state machine: each one is a
/// single guarded UPDATE so two workers racing on the same payment cannot
/// both advance it.
pub struct Payments<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    pub async fn create(&mut self, request: &PaymentCreateDBRequest) -> Result<PaymentDBResponse> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, application_id, cycle_index, payment_type, status,
                amount_cents, description, attempts, created_at
            )
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, 0, ?)
            "#,
        )
        .bind(id)
        .bind(request.user_id)
        .bind(request.application_id)
        .bind(request.cycle_index)
        .bind(request.payment_type)
        .bind(to_cents(request.amount))
        .bind(&request.description)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        self.get_expect(id).await
    }

    /// Record a ledger charge for one billing cycle, exactly once.
    ///
    /// The unique index on (application_id, cycle_index, payment_type) makes
    /// re-running a billing pass a no-op: when the charge already exists the
    /// insert is ignored and `None` is returned.
    pub async fn create_cycle_charge(
        &mut self,
        request: &PaymentCreateDBRequest,
    ) -> Result<Option<PaymentDBResponse>> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO payments (
                id, user_id, application_id, cycle_index, payment_type, status,
                amount_cents, description, attempts, created_at
            )
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?, 0, ?)
            "#,
        )
        .bind(id)
        .bind(request.user_id)
        .bind(request.application_id)
        .bind(request.cycle_index)
        .bind(request.payment_type)
        .bind(to_cents(request.amount))
        .bind(&request.description)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(Some(self.get_expect(id).await?))
    }

    pub async fn get_by_id(&mut self, id: PaymentId) -> Result<Option<PaymentDBResponse>> {
        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(row.map(PaymentDBResponse::from))
    }

    pub async fn list(&mut self, filter: &PaymentFilter) -> Result<Vec<PaymentDBResponse>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT * FROM payments
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR payment_type = ?3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.status)
        .bind(filter.payment_type)
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(PaymentDBResponse::from).collect())
    }

    /// Payments awaiting settlement: submitted but not yet resolved by the
    /// processor.
    pub async fn list_unresolved(&mut self) -> Result<Vec<PaymentDBResponse>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            "SELECT * FROM payments WHERE status = 'processing' ORDER BY created_at",
        )
        .fetch_all(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        Ok(rows.into_iter().map(PaymentDBResponse::from).collect())
    }

    pub async fn find_by_processor_ref(&mut self, processor_ref: &str) -> Result<Option<PaymentDBResponse>> {
        let row = sqlx::query_as::<_, PaymentRow>("SELECT * FROM payments WHERE processor_ref = ?")
            .bind(processor_ref)
            .fetch_optional(&mut *self.db)
            .await
            .map_err(DbError::from)?;

        Ok(row.map(PaymentDBResponse::from))
    }

    /// Hand a pending payment to the processor: pending -> processing,
    /// recording the processor's reference and counting the attempt.
    pub async fn mark_processing(&mut self, id: PaymentId, processor_ref: &str) -> Result<PaymentDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'processing', processor_ref = ?, attempts = attempts + 1
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(processor_ref)
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }
        self.transition_failure(id, PaymentStatus::Processing).await
    }

    /// Resolve a processing payment to its settlement outcome,
    /// completed or failed.
    pub async fn settle(&mut self, id: PaymentId, outcome: PaymentStatus) -> Result<PaymentDBResponse> {
        if !matches!(outcome, PaymentStatus::Completed | PaymentStatus::Failed) {
            return Err(Error::Validation {
                message: format!("settlement outcome must be completed or failed, got {}", outcome.as_str()),
            });
        }

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?, processed_at = ?
            WHERE id = ? AND status = 'processing'
            "#,
        )
        .bind(outcome)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }
        self.transition_failure(id, outcome).await
    }

    /// Put a failed payment back in the queue: failed -> pending, keeping the
    /// attempt count. Refuses once `max_attempts` submissions have been made.
    pub async fn retry_failed(&mut self, id: PaymentId, max_attempts: u32) -> Result<PaymentDBResponse> {
        let payment = self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Payment".to_string(),
            id: id.to_string(),
        })?;

        if payment.status != PaymentStatus::Failed {
            return Err(self.invalid_transition(id, payment.status, PaymentStatus::Pending));
        }
        if payment.attempts >= i64::from(max_attempts) {
            return Err(ConflictError::RetriesExhausted {
                payment_id: id,
                max_attempts,
            }
            .into());
        }

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'pending', processor_ref = NULL, processed_at = NULL
            WHERE id = ? AND status = 'failed' AND attempts < ?
            "#,
        )
        .bind(id)
        .bind(i64::from(max_attempts))
        .execute(&mut *self.db)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 1 {
            return self.get_expect(id).await;
        }
        self.transition_failure(id, PaymentStatus::Pending).await
    }

    /// Reverse a completed payment: completed -> refunded.
    pub async fn refund(&mut self, id: PaymentId) -> Result<PaymentDBResponse> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'refunded', processed_at = ?
            WHERE id = ? AND status = 'completed'
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
        self.transition_failure(id, PaymentStatus::Refunded).await
    }

    async fn get_expect(&mut self, id: PaymentId) -> Result<PaymentDBResponse> {
        self.get_by_id(id).await?.ok_or_else(|| {
            Error::Other(anyhow::anyhow!("payment {id} vanished mid-operation"))
        })
    }

    async fn transition_failure(&mut self, id: PaymentId, to: PaymentStatus) -> Result<PaymentDBResponse> {
        let payment = self.get_by_id(id).await?.ok_or_else(|| Error::NotFound {
            resource: "Payment".to_string(),
            id: id.to_string(),
        })?;
        Err(self.invalid_transition(id, payment.status, to))
    }

    fn invalid_transition(&self, id: PaymentId, from: PaymentStatus, to: PaymentStatus) -> Error {
        ConflictError::InvalidTransition {
            entity: "payment",
            id: id.to_string(),
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        }
        .into()
    }
}
