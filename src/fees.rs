//! Late-fee policy. Pure arithmetic over a due date and a return date.
//!
//! Overdue days are counted as whole calendar days (UTC) between the due date
//! and the return date. The first `tier1_days` overdue days accrue at the
//! tier 1 rate, every later day at the tier 2 rate, and the total is capped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};
use crate::models::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub tier1_rate_cents: i64,
    pub tier1_days: i64,
    pub tier2_rate_cents: i64,
    /// Maximum fee charged for a single loan.
    pub max_fee_cents: i64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            tier1_rate_cents: 50,
            tier1_days: 7,
            tier2_rate_cents: 100,
            max_fee_cents: 1500,
        }
    }
}

/// Outcome of a fee calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeAssessment {
    pub amount: Money,
    /// Zero when the book was (or would be) returned on time.
    pub days_overdue: i64,
}

impl FeeAssessment {
    pub const NONE: FeeAssessment = FeeAssessment {
        amount: Money::ZERO,
        days_overdue: 0,
    };
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<()> {
        if self.tier1_rate_cents < 0 || self.tier2_rate_cents < 0 {
            return Err(LibraryError::config("fee rates must not be negative"));
        }
        if self.tier1_days < 0 {
            return Err(LibraryError::config("fees.tier1_days must not be negative"));
        }
        if self.max_fee_cents < 0 {
            return Err(LibraryError::config("fees.max_fee_cents must not be negative"));
        }
        Ok(())
    }

    /// Assess the fee for a book due at `due_date` and returned at
    /// `return_date`. For outstanding loans pass the current time to get an
    /// estimate of what would be owed if it were returned now.
    pub fn assess(&self, due_date: DateTime<Utc>, return_date: DateTime<Utc>) -> FeeAssessment {
        let days_overdue = overdue_days(due_date, return_date);
        if days_overdue <= 0 {
            return FeeAssessment::NONE;
        }

        let tier1_days = days_overdue.min(self.tier1_days);
        let tier2_days = days_overdue - tier1_days;
        let computed = tier1_days
            .saturating_mul(self.tier1_rate_cents)
            .saturating_add(tier2_days.saturating_mul(self.tier2_rate_cents));

        FeeAssessment {
            amount: Money::from_cents(computed.min(self.max_fee_cents)),
            days_overdue,
        }
    }
}

/// Late fee under the standard schedule: $0.50/day for days 1-7, $1.00/day
/// afterwards, capped at $15.00.
pub fn compute_fee(due_date: DateTime<Utc>, return_date: DateTime<Utc>) -> Money {
    FeeSchedule::default().assess(due_date, return_date).amount
}

fn overdue_days(due_date: DateTime<Utc>, return_date: DateTime<Utc>) -> i64 {
    (return_date.date_naive() - due_date.date_naive()).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap()
    }

    fn cents(days: i64) -> i64 {
        compute_fee(due(), due() + Duration::days(days)).cents()
    }

    #[test]
    fn on_time_or_early_costs_nothing() {
        assert_eq!(compute_fee(due(), due()), Money::ZERO);
        assert_eq!(cents(-3), 0);
        assert_eq!(compute_fee(due(), due() + Duration::hours(5)), Money::ZERO);
    }

    #[test]
    fn tier_one_accrues_half_a_dollar_per_day() {
        assert_eq!(cents(1), 50);
        assert_eq!(cents(3), 150);
        assert_eq!(cents(7), 350);
    }

    #[test]
    fn tier_two_starts_on_day_eight() {
        assert_eq!(cents(8), 450);
        assert_eq!(cents(9), 550);
        assert_eq!(cents(18), 1450);
    }

    #[test]
    fn fee_is_capped() {
        assert_eq!(cents(19), 1500);
        assert_eq!(cents(100), 1500);
        assert_eq!(compute_fee(due(), due() + Duration::days(100)).to_string(), "15.00");
    }

    #[test]
    fn partial_days_count_by_calendar_date() {
        let returned = Utc.with_ymd_and_hms(2025, 3, 2, 9, 0, 0).unwrap();
        let assessment = FeeSchedule::default().assess(due(), returned);
        assert_eq!(assessment.days_overdue, 1);
        assert_eq!(assessment.amount, Money::from_cents(50));
    }

    #[test]
    fn custom_schedule_is_honored() {
        let schedule = FeeSchedule {
            tier1_rate_cents: 25,
            tier1_days: 2,
            tier2_rate_cents: 200,
            max_fee_cents: 500,
        };
        let assessment = schedule.assess(due(), due() + Duration::days(3));
        assert_eq!(assessment.amount, Money::from_cents(250));
        assert_eq!(assessment.days_overdue, 3);
        assert_eq!(
            schedule.assess(due(), due() + Duration::days(30)).amount,
            Money::from_cents(500)
        );
    }

    #[test]
    fn negative_rates_are_invalid() {
        let schedule = FeeSchedule {
            tier1_rate_cents: -1,
            ..FeeSchedule::default()
        };
        assert!(schedule.validate().is_err());
    }
}
