//! Database request/response models.
//!
//! Each entity has a `*CreateDBRequest` / `*UpdateDBRequest` pair consumed by
//! its repository, and a `*DBResponse` returned from queries. Enums stored as
//! TEXT derive `sqlx::Type` with snake_case renaming so the wire names match
//! the CHECK constraints in the migration.

pub mod applications;
pub mod campaigns;
pub mod payments;
pub mod users;
pub mod verifications;

use rust_decimal::{Decimal, RoundingStrategy};

/// Convert a dollar amount to the integer cents stored in SQLite.
///
/// Amounts are rounded half-up to two decimal places first, so callers can
/// pass computed values without worrying about sub-cent residue.
pub fn to_cents(amount: Decimal) -> i64 {
    // round_dp's default is half-even, which turns 15.005 into 15.00
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (rounded * Decimal::from(100)).trunc().try_into().unwrap_or(i64::MAX)
}

/// Convert stored integer cents back to a two-decimal dollar amount.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}
