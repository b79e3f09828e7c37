//! In-process processor that settles everything instantly.

use super::{PaymentIntent, PaymentProcessor, ProcessorError, SettlementStatus};
use crate::config::DummyProcessorConfig;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Settles every intent immediately, succeeding unless configured to fail.
/// Intents live in memory only; a restart forgets them, which is fine for the
/// development and test flows this processor exists for.
pub struct DummyProcessor {
    config: DummyProcessorConfig,
    intents: Mutex<HashMap<String, SettlementStatus>>,
}

impl DummyProcessor {
    pub fn new(config: DummyProcessorConfig) -> Self {
        Self {
            config,
            intents: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for DummyProcessor {
    async fn create_intent(&self, intent: &PaymentIntent) -> Result<String, ProcessorError> {
        let processor_ref = format!("dummy_pi_{}", Uuid::new_v4().simple());
        let outcome = if self.config.always_fail {
            SettlementStatus::Failed
        } else {
            SettlementStatus::Succeeded
        };

        tracing::debug!(
            payment_id = %intent.payment_id,
            %processor_ref,
            amount = %intent.amount,
            "dummy processor accepted intent"
        );
        self.intents
            .lock()
            .expect("dummy processor mutex poisoned")
            .insert(processor_ref.clone(), outcome);
        Ok(processor_ref)
    }

    async fn fetch_status(&self, processor_ref: &str) -> Result<SettlementStatus, ProcessorError> {
        self.intents
            .lock()
            .expect("dummy processor mutex poisoned")
            .get(processor_ref)
            .copied()
            .ok_or_else(|| ProcessorError::UnknownReference(processor_ref.to_string()))
    }
}
