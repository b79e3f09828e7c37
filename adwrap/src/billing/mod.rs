//! Billing: verification cadence, the per-cycle ledger, and settlement.
//!
//! A billing run is three phases, each idempotent on its own:
//!
//! 1. [`ledger::run`] walks every approved application, computes the
//!    verification cycles that have come due, and records the cycle's charges
//!    (platform fee, manufacturing fee, driver payment) as pending payments.
//!    A cycle without a verification photo is reported overdue and its driver
//!    payment withheld.
//! 2. [`ledger::submit_pending`] hands pending payments to the configured
//!    processor.
//! 3. [`ledger::reconcile`] polls the processor for in-flight payments and
//!    records their settlement outcome.

pub mod cadence;
pub mod ledger;

pub use cadence::{CycleWindow, elapsed_cycles};
pub use ledger::{LedgerSummary, OverdueCycle};
