//! The billing ledger: turns elapsed verification cycles into payment records
//! and drives them through the processor.

use crate::billing::cadence::elapsed_cycles;
use crate::config::{BillingConfig, RetryConfig};
use crate::db::errors::DbError;
use crate::db::handlers::{Applications, Campaigns, Payments, Repository, Verifications};
use crate::db::handlers::applications::ApplicationFilter;
use crate::db::handlers::payments::PaymentFilter;
use crate::db::models::applications::{ApplicationDBResponse, ApplicationStatus};
use crate::db::models::campaigns::CampaignDBResponse;
use crate::db::models::payments::{PaymentCreateDBRequest, PaymentStatus, PaymentType};
use crate::errors::{Error, Result};
use crate::payment_processors::{PaymentIntent, PaymentProcessor, SettlementStatus};
use crate::retry::with_backoff;
use crate::types::{ApplicationId, CampaignId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

/// A verification cycle whose deadline passed without a photo submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverdueCycle {
    #[schema(value_type = String, format = "uuid")]
    pub application_id: ApplicationId,
    #[schema(value_type = String, format = "uuid")]
    pub driver_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub campaign_id: CampaignId,
    pub cycle_index: i64,
    pub deadline: DateTime<Utc>,
}

/// Outcome of a ledger run.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct LedgerSummary {
    /// Cycles whose deadline had passed and were examined
    pub cycles_processed: u64,
    /// Payment records created (re-runs over the same cycles create none)
    pub charges_created: u64,
    /// Cycles missing their verification photo; driver payments withheld
    pub overdue: Vec<OverdueCycle>,
}

/// Record the charges for every verification cycle that has come due as of
/// `as_of`.
///
/// Each elapsed cycle of each approved application yields up to three
/// charges: the platform fee and the sticker manufacturing fee billed to the
/// advertiser, and the campaign's monthly payment owed to the driver. The
/// driver payment is withheld for overdue cycles. Charges are keyed by
/// (application, cycle, type), so running the ledger twice never
/// double-charges.
pub async fn run(pool: &SqlitePool, config: &BillingConfig, as_of: DateTime<Utc>) -> Result<LedgerSummary> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;

    let approved = Applications::new(&mut conn)
        .list(&ApplicationFilter {
            status: Some(ApplicationStatus::Approved),
            ..Default::default()
        })
        .await?;

    let mut summary = LedgerSummary::default();

    for application in &approved {
        let Some(approved_at) = application.approved_at else {
            tracing::error!(application_id = %application.id, "approved application has no approval timestamp");
            continue;
        };
        let campaign = Campaigns::new(&mut conn)
            .get_by_id(application.campaign_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Campaign".to_string(),
                id: application.campaign_id.to_string(),
            })?;

        for cycle in elapsed_cycles(approved_at, as_of, config.cadence_months, config.grace) {
            summary.cycles_processed += 1;

            let verified = Verifications::new(&mut conn)
                .has_submission_in(
                    application.driver_id,
                    application.campaign_id,
                    cycle.opens_at,
                    cycle.deadline,
                )
                .await?;

            let mut payments = Payments::new(&mut conn);
            for request in cycle_charges(application, &campaign, cycle.index, config, verified) {
                if payments.create_cycle_charge(&request).await?.is_some() {
                    summary.charges_created += 1;
                }
            }

            if !verified {
                tracing::warn!(
                    application_id = %application.id,
                    driver_id = %application.driver_id,
                    cycle = cycle.index,
                    deadline = %cycle.deadline,
                    "verification overdue, driver payment withheld"
                );
                summary.overdue.push(OverdueCycle {
                    application_id: application.id,
                    driver_id: application.driver_id,
                    campaign_id: application.campaign_id,
                    cycle_index: cycle.index,
                    deadline: cycle.deadline,
                });
            }
        }
    }

    tracing::info!(
        cycles = summary.cycles_processed,
        charges = summary.charges_created,
        overdue = summary.overdue.len(),
        "ledger run complete"
    );
    Ok(summary)
}

fn cycle_charges(
    application: &ApplicationDBResponse,
    campaign: &CampaignDBResponse,
    cycle_index: i64,
    config: &BillingConfig,
    verified: bool,
) -> Vec<PaymentCreateDBRequest> {
    let mut charges = vec![
        PaymentCreateDBRequest {
            user_id: campaign.advertiser_id,
            application_id: Some(application.id),
            cycle_index: Some(cycle_index),
            payment_type: PaymentType::MonthlyFee,
            amount: config.platform_fee,
            description: "Monthly platform fee".to_string(),
        },
        PaymentCreateDBRequest {
            user_id: campaign.advertiser_id,
            application_id: Some(application.id),
            cycle_index: Some(cycle_index),
            payment_type: PaymentType::ManufacturingFee,
            amount: campaign.sticker_size.unit_price(),
            description: "Sticker manufacturing fee (1 sticker)".to_string(),
        },
    ];

    if verified {
        charges.push(PaymentCreateDBRequest {
            user_id: application.driver_id,
            application_id: Some(application.id),
            cycle_index: Some(cycle_index),
            payment_type: PaymentType::DriverPayment,
            amount: campaign.monthly_payment,
            description: format!("Driver payment for campaign \"{}\"", campaign.title),
        });
    }

    charges
}

/// Submit every pending payment to the processor.
///
/// Intent creation is not idempotent, so it is never auto-retried here; a
/// submission that errors leaves the payment pending for the next run.
pub async fn submit_pending(pool: &SqlitePool, processor: &dyn PaymentProcessor) -> Result<u64> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let pending = Payments::new(&mut conn)
        .list(&PaymentFilter {
            status: Some(PaymentStatus::Pending),
            ..Default::default()
        })
        .await?;

    let mut submitted = 0u64;
    for payment in pending {
        let intent = PaymentIntent {
            payment_id: payment.id,
            user_id: payment.user_id,
            amount: payment.amount,
            purpose: payment.payment_type,
        };
        match processor.create_intent(&intent).await {
            Ok(processor_ref) => {
                Payments::new(&mut conn).mark_processing(payment.id, &processor_ref).await?;
                submitted += 1;
            }
            Err(error) => {
                tracing::warn!(payment_id = %payment.id, %error, "intent submission failed, left pending");
            }
        }
    }
    Ok(submitted)
}

/// Poll the processor for every in-flight payment and record settlements.
/// Status polling is idempotent, so transient processor errors are retried
/// under `retry_config`.
pub async fn reconcile(
    pool: &SqlitePool,
    processor: &dyn PaymentProcessor,
    retry_config: &RetryConfig,
) -> Result<u64> {
    let mut conn = pool.acquire().await.map_err(DbError::from)?;
    let unresolved = Payments::new(&mut conn).list_unresolved().await?;

    let mut settled = 0u64;
    for payment in unresolved {
        let Some(processor_ref) = payment.processor_ref.as_deref() else {
            tracing::error!(payment_id = %payment.id, "processing payment has no processor reference");
            continue;
        };

        let status = with_backoff(retry_config, || processor.fetch_status(processor_ref)).await;
        match status {
            Ok(SettlementStatus::Succeeded) => {
                Payments::new(&mut conn).settle(payment.id, PaymentStatus::Completed).await?;
                settled += 1;
            }
            Ok(SettlementStatus::Failed) => {
                Payments::new(&mut conn).settle(payment.id, PaymentStatus::Failed).await?;
                settled += 1;
            }
            Ok(SettlementStatus::InFlight) => {}
            Err(error) => {
                tracing::warn!(payment_id = %payment.id, %error, "status poll failed, will retry next run");
            }
        }
    }
    Ok(settled)
}
