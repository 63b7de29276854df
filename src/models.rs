//! Domain models that mirror the SQLite schema and get passed between the
//! catalog, the loan ledger, the lending engine and the terminal front-end.
//! These types stay light-weight data holders; the rules that govern them
//! live in the components that own their write paths.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// A catalog entry with a finite number of physical copies.
pub struct Book {
    /// Primary key assigned by the store on insert.
    pub id: i64,
    pub title: String,
    pub author: String,
    /// Thirteen ASCII digits, unique across the catalog.
    pub isbn: String,
    /// Copies the library owns. Never changes after creation.
    pub total_copies: u32,
    /// Copies currently on the shelf. Always `<= total_copies`.
    pub available_copies: u32,
}

impl Book {
    /// True when at least one copy can be lent out right now.
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Lifecycle of a loan. `Outstanding` is the only state a loan is created
/// in and `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Outstanding,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Outstanding => "OUTSTANDING",
            LoanStatus::Returned => "RETURNED",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// One lending of one copy of a book to one patron.
pub struct Loan {
    pub id: i64,
    /// Opaque patron identifier, validated by the patron registry before the
    /// loan was created.
    pub patron_id: String,
    pub book_id: i64,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// Set exactly once, when the loan is closed.
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    /// Late fee assessed at return time. `None` while outstanding.
    pub fee: Option<Money>,
}

impl Loan {
    pub fn is_outstanding(&self) -> bool {
        self.status == LoanStatus::Outstanding
    }
}

/// Monetary amount held as a whole number of cents so that fee arithmetic
/// never drifts. Renders with exactly two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Amounts cross the serialization boundary as decimal strings ("3.50") so
/// consumers never see binary floating point artifacts.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_two_decimal_places() {
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
        assert_eq!(Money::from_cents(350).to_string(), "3.50");
        assert_eq!(Money::from_cents(1500).to_string(), "15.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn money_sums() {
        let total: Money = [150, 450, 1500].into_iter().map(Money::from_cents).sum();
        assert_eq!(total, Money::from_cents(2100));
    }

    #[test]
    fn book_availability_follows_copy_count() {
        let mut book = Book {
            id: 1,
            title: "Dune".into(),
            author: "Herbert".into(),
            isbn: "1234567890123".into(),
            total_copies: 1,
            available_copies: 1,
        };
        assert!(book.is_available());
        book.available_copies = 0;
        assert!(!book.is_available());
    }
}
