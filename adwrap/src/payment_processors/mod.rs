//! Payment processor abstraction.
//!
//! The ledger computes what is owed; actually moving money is delegated to a
//! processor behind the [`PaymentProcessor`] trait. The service never sees
//! card numbers or bank credentials beyond the payout details drivers supply:
//! the processor holds the real instruments and hands back opaque references.

pub mod dummy;

use crate::config::PaymentConfig;
use crate::db::models::payments::PaymentType;
use crate::types::{PaymentId, UserId};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a payment processor.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// The processor rejected the request as malformed or unauthorized
    #[error("processor rejected request: {0}")]
    Rejected(String),

    /// The referenced intent is unknown to the processor
    #[error("unknown processor reference: {0}")]
    UnknownReference(String),

    /// Transient transport or availability failure; safe to retry idempotent calls
    #[error("processor unavailable: {0}")]
    Unavailable(String),
}

/// A charge or payout to be executed by the processor.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub payment_id: PaymentId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub purpose: PaymentType,
}

/// Outcome of a settlement-status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementStatus {
    /// The processor is still working on it
    InFlight,
    Succeeded,
    Failed,
}

/// Interface to an external payment processor.
///
/// `create_intent` is not idempotent and must be called at most once per
/// submission attempt; `fetch_status` is idempotent and may be retried.
#[async_trait::async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Submit an intent for execution, returning the processor's reference.
    async fn create_intent(&self, intent: &PaymentIntent) -> Result<String, ProcessorError>;

    /// Poll the settlement status of a previously created intent.
    async fn fetch_status(&self, processor_ref: &str) -> Result<SettlementStatus, ProcessorError>;
}

/// Build the processor selected by configuration.
pub fn create_processor(config: &PaymentConfig) -> Arc<dyn PaymentProcessor> {
    match config {
        PaymentConfig::Dummy(dummy_config) => Arc::new(dummy::DummyProcessor::new(dummy_config.clone())),
    }
}
