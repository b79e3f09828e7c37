//! Verification cycle arithmetic.
//!
//! Cycles are anchored at the application's approval time and advance in
//! calendar months, so a driver approved on January 31st gets sane windows in
//! February. The grace period shifts only the deadline, never the window.

use chrono::{DateTime, Months, Utc};
use std::time::Duration;

/// One verification cycle for an approved application.
///
/// The window `[opens_at, closes_at)` is when the driver is expected to
/// submit a photo; the cycle becomes chargeable (and, absent a photo,
/// overdue) once `deadline` has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    /// Zero-based cycle number since approval
    pub index: i64,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    /// `closes_at` plus the configured grace period
    pub deadline: DateTime<Utc>,
}

/// The cycles of an application whose deadline has passed as of `now`.
///
/// `approved_at` anchors cycle 0. Months are calendar months; when the
/// anchor day does not exist in a target month, chrono clamps to its last
/// day.
pub fn elapsed_cycles(
    approved_at: DateTime<Utc>,
    now: DateTime<Utc>,
    cadence_months: u32,
    grace: Duration,
) -> Vec<CycleWindow> {
    let grace = chrono::Duration::from_std(grace).unwrap_or_else(|_| chrono::Duration::zero());
    let mut cycles = Vec::new();
    let mut index = 0i64;
    let mut opens_at = approved_at;

    loop {
        let months = Months::new(cadence_months.saturating_mul(index as u32 + 1));
        let Some(closes_at) = approved_at.checked_add_months(months) else {
            break;
        };
        let deadline = closes_at + grace;
        if deadline > now {
            break;
        }
        cycles.push(CycleWindow {
            index,
            opens_at,
            closes_at,
            deadline,
        });
        opens_at = closes_at;
        index += 1;
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    const GRACE: Duration = Duration::from_secs(3 * 24 * 60 * 60);

    #[test]
    fn no_cycles_before_first_deadline() {
        let approved = utc(2025, 1, 15);
        // Window closes Feb 15, deadline Feb 18; Feb 16 is still in grace
        assert!(elapsed_cycles(approved, utc(2025, 2, 16), 1, GRACE).is_empty());
    }

    #[test]
    fn one_cycle_after_its_deadline_passes() {
        let approved = utc(2025, 1, 15);
        let cycles = elapsed_cycles(approved, utc(2025, 2, 19), 1, GRACE);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].index, 0);
        assert_eq!(cycles[0].opens_at, approved);
        assert_eq!(cycles[0].closes_at, utc(2025, 2, 15));
        assert_eq!(cycles[0].deadline, utc(2025, 2, 18));
    }

    #[test]
    fn windows_are_contiguous_across_cycles() {
        let approved = utc(2025, 1, 15);
        let cycles = elapsed_cycles(approved, utc(2025, 4, 20), 1, GRACE);
        assert_eq!(cycles.len(), 3);
        for pair in cycles.windows(2) {
            assert_eq!(pair[0].closes_at, pair[1].opens_at);
        }
    }

    #[test]
    fn month_end_anchors_clamp() {
        let approved = utc(2025, 1, 31);
        let cycles = elapsed_cycles(approved, utc(2025, 3, 10), 1, GRACE);
        assert_eq!(cycles.len(), 1);
        // January 31 + 1 month clamps to February 28
        assert_eq!(cycles[0].closes_at, utc(2025, 2, 28));
    }

    #[test]
    fn multi_month_cadence() {
        let approved = utc(2025, 1, 15);
        let cycles = elapsed_cycles(approved, utc(2025, 7, 20), 3, GRACE);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0].closes_at, utc(2025, 4, 15));
        assert_eq!(cycles[1].closes_at, utc(2025, 7, 15));
    }
}
