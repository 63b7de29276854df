//! Lending engine: the only writer of copy counts and loan status.
//!
//! Borrow and return each run as one `BEGIN IMMEDIATE` transaction while
//! holding the keyed locks of the patron and of the book, so the
//! check-then-mutate sequence is atomic per book and per patron. Any failure
//! rolls the transaction back and leaves copy counts and loans untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use serde::Serialize;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::db::{self, Database};
use crate::error::{LibraryError, Result};
use crate::fees::{FeeAssessment, FeeSchedule};
use crate::ledger::Ledger;
use crate::locks::{KeyedLocks, LockKey};
use crate::models::Loan;
use crate::patrons::PatronRegistry;

/// Limits and rates the engine enforces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendingPolicy {
    pub loan_period_days: u32,
    pub borrow_limit: u32,
    pub fees: FeeSchedule,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            borrow_limit: 5,
            fees: FeeSchedule::default(),
        }
    }
}

impl From<&Settings> for LendingPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            loan_period_days: settings.lending.loan_period_days,
            borrow_limit: settings.lending.borrow_limit,
            fees: settings.fees.clone(),
        }
    }
}

/// Result of a successful return: the closed loan and what it cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnReceipt {
    pub loan: Loan,
    pub fee: FeeAssessment,
}

pub struct LendingEngine {
    db: Database,
    patrons: Arc<dyn PatronRegistry>,
    locks: KeyedLocks,
    policy: LendingPolicy,
}

impl LendingEngine {
    pub fn new(db: Database, patrons: Arc<dyn PatronRegistry>, policy: LendingPolicy) -> Self {
        Self {
            db,
            patrons,
            locks: KeyedLocks::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    /// Lend one copy of `book_id` to `patron_id`, due one loan period after
    /// `now`.
    pub fn borrow(&self, patron_id: &str, book_id: i64, now: DateTime<Utc>) -> Result<Loan> {
        self.ensure_patron(patron_id)?;

        let keys = [LockKey::Patron(patron_id.to_string()), LockKey::Book(book_id)];
        let result = self
            .locks
            .with_locked(&keys, || self.borrow_locked(patron_id, book_id, now));

        match &result {
            Ok(loan) => tracing::info!(
                patron_id,
                book_id,
                loan_id = loan.id,
                due = %loan.due_date.date_naive(),
                "book borrowed"
            ),
            Err(err) => log_failure("borrow", patron_id, book_id, err),
        }
        result
    }

    fn borrow_locked(&self, patron_id: &str, book_id: i64, now: DateTime<Utc>) -> Result<Loan> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let loan = {
            let catalog = Catalog::new(&tx);
            let ledger = Ledger::with_loan_period(&tx, self.policy.loan_period_days);

            let book = catalog.get(book_id)?;
            if !book.is_available() {
                return Err(LibraryError::NoCopiesAvailable { book_id });
            }

            if ledger.count_outstanding(patron_id)? >= self.policy.borrow_limit {
                return Err(LibraryError::BorrowLimitExceeded {
                    patron_id: patron_id.to_string(),
                    limit: self.policy.borrow_limit,
                });
            }

            db::decrement_available(&tx, book_id)?;
            ledger.create(patron_id, book_id, now)?
        };

        tx.commit()?;
        Ok(loan)
    }

    /// Close the patron's outstanding loan of `book_id` as of `now`, assess
    /// the late fee and put the copy back on the shelf.
    pub fn return_book(
        &self,
        patron_id: &str,
        book_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt> {
        self.ensure_patron(patron_id)?;

        let keys = [LockKey::Patron(patron_id.to_string()), LockKey::Book(book_id)];
        let result = self
            .locks
            .with_locked(&keys, || self.return_locked(patron_id, book_id, now));

        match &result {
            Ok(receipt) => tracing::info!(
                patron_id,
                book_id,
                loan_id = receipt.loan.id,
                fee = %receipt.fee.amount,
                days_overdue = receipt.fee.days_overdue,
                "book returned"
            ),
            Err(err) => log_failure("return", patron_id, book_id, err),
        }
        result
    }

    fn return_locked(
        &self,
        patron_id: &str,
        book_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let receipt = {
            let ledger = Ledger::with_loan_period(&tx, self.policy.loan_period_days);

            let loan = ledger
                .find_outstanding(patron_id, book_id)
                .map_err(|err| match err {
                    LibraryError::NotFound { .. } => LibraryError::NoActiveLoan {
                        patron_id: patron_id.to_string(),
                        book_id,
                    },
                    other => other,
                })?;

            let fee = self.policy.fees.assess(loan.due_date, now);
            let loan = ledger.close(loan.id, now, fee.amount)?;
            db::increment_available(&tx, book_id)?;
            ReturnReceipt { loan, fee }
        };

        tx.commit()?;
        Ok(receipt)
    }

    fn ensure_patron(&self, patron_id: &str) -> Result<()> {
        if self.patrons.is_recognized(patron_id) {
            Ok(())
        } else {
            tracing::debug!(patron_id, "unrecognized patron");
            Err(LibraryError::InvalidPatron {
                patron_id: patron_id.to_string(),
            })
        }
    }
}

fn log_failure(action: &str, patron_id: &str, book_id: i64, err: &LibraryError) {
    if err.is_rejection() {
        tracing::debug!(patron_id, book_id, "{action} rejected: {err}");
    } else {
        tracing::error!(patron_id, book_id, "{action} failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LoanStatus, Money};
    use crate::patrons::CardNumberRegistry;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        db: Database,
        engine: LendingEngine,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("lending.sqlite")).unwrap();
        let engine = LendingEngine::new(
            db.clone(),
            Arc::new(CardNumberRegistry::default()),
            LendingPolicy::default(),
        );
        Fixture {
            _dir: dir,
            db,
            engine,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 10, 9, 0, 0).unwrap()
    }

    impl Fixture {
        fn add_book(&self, isbn: &str, copies: i64) -> i64 {
            let conn = self.db.connect().unwrap();
            Catalog::new(&conn).add("Book", "Author", isbn, copies).unwrap().id
        }

        fn available(&self, book_id: i64) -> u32 {
            let conn = self.db.connect().unwrap();
            Catalog::new(&conn).get(book_id).unwrap().available_copies
        }

        fn outstanding(&self, patron_id: &str) -> u32 {
            let conn = self.db.connect().unwrap();
            Ledger::new(&conn).count_outstanding(patron_id).unwrap()
        }
    }

    #[test]
    fn borrow_decrements_and_opens_loan() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 2);
        let loan = fx.engine.borrow("111111", book, now()).unwrap();
        assert_eq!(loan.status, LoanStatus::Outstanding);
        assert_eq!(loan.due_date, now() + Duration::days(14));
        assert_eq!(fx.available(book), 1);
    }

    #[test]
    fn borrow_rejects_unknown_patron_before_touching_state() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        let err = fx.engine.borrow("12ab", book, now()).unwrap_err();
        assert!(matches!(err, LibraryError::InvalidPatron { .. }));
        assert_eq!(fx.available(book), 1);
    }

    #[test]
    fn borrow_unknown_book_is_not_found() {
        let fx = fixture();
        let err = fx.engine.borrow("111111", 77, now()).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { id: 77, .. }));
    }

    #[test]
    fn borrow_without_copies_is_rejected() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        fx.engine.borrow("111111", book, now()).unwrap();
        let err = fx.engine.borrow("222222", book, now()).unwrap_err();
        assert!(matches!(err, LibraryError::NoCopiesAvailable { book_id } if book_id == book));
        assert_eq!(fx.available(book), 0);
        assert_eq!(fx.outstanding("222222"), 0);
    }

    #[test]
    fn sixth_loan_is_refused() {
        let fx = fixture();
        for i in 0..5 {
            let book = fx.add_book(&format!("000000000000{i}"), 1);
            fx.engine.borrow("111111", book, now()).unwrap();
        }
        let sixth = fx.add_book("0000000000009", 1);
        let err = fx.engine.borrow("111111", sixth, now()).unwrap_err();
        assert!(matches!(err, LibraryError::BorrowLimitExceeded { limit: 5, .. }));
        assert_eq!(fx.available(sixth), 1);
        assert_eq!(fx.outstanding("111111"), 5);
    }

    #[test]
    fn same_book_twice_counts_twice() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 2);
        fx.engine.borrow("111111", book, now()).unwrap();
        fx.engine.borrow("111111", book, now()).unwrap();
        assert_eq!(fx.outstanding("111111"), 2);
        assert_eq!(fx.available(book), 0);
    }

    #[test]
    fn return_closes_loan_and_restores_copy() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        fx.engine.borrow("111111", book, now()).unwrap();

        let receipt = fx
            .engine
            .return_book("111111", book, now() + Duration::days(10))
            .unwrap();
        assert_eq!(receipt.loan.status, LoanStatus::Returned);
        assert_eq!(receipt.fee.amount, Money::ZERO);
        assert_eq!(receipt.loan.fee, Some(Money::ZERO));
        assert_eq!(fx.available(book), 1);
    }

    #[test]
    fn late_return_is_charged() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        fx.engine.borrow("111111", book, now()).unwrap();

        let receipt = fx
            .engine
            .return_book("111111", book, now() + Duration::days(22))
            .unwrap();
        assert_eq!(receipt.fee.days_overdue, 8);
        assert_eq!(receipt.fee.amount.to_string(), "4.50");
        assert_eq!(receipt.loan.fee, Some(Money::from_cents(450)));
    }

    #[test]
    fn return_without_loan_is_rejected() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        let err = fx.engine.return_book("111111", book, now()).unwrap_err();
        assert!(matches!(err, LibraryError::NoActiveLoan { .. }));

        fx.engine.borrow("111111", book, now()).unwrap();
        fx.engine.return_book("111111", book, now()).unwrap();
        let err = fx.engine.return_book("111111", book, now()).unwrap_err();
        assert!(matches!(err, LibraryError::NoActiveLoan { .. }));
        assert_eq!(fx.available(book), 1);
    }

    #[test]
    fn return_by_another_patron_is_rejected() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        fx.engine.borrow("111111", book, now()).unwrap();
        let err = fx.engine.return_book("222222", book, now()).unwrap_err();
        assert!(matches!(err, LibraryError::NoActiveLoan { .. }));
        assert_eq!(fx.available(book), 0);
    }

    #[test]
    fn return_before_borrow_date_rolls_back() {
        let fx = fixture();
        let book = fx.add_book("1234567890123", 1);
        fx.engine.borrow("111111", book, now()).unwrap();
        let err = fx
            .engine
            .return_book("111111", book, now() - Duration::days(1))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation { .. }));
        assert_eq!(fx.available(book), 0);
        assert_eq!(fx.outstanding("111111"), 1);
    }

    #[test]
    fn policy_follows_settings() {
        let mut settings = Settings::default();
        settings.lending.borrow_limit = 2;
        settings.lending.loan_period_days = 7;
        let policy = LendingPolicy::from(&settings);
        assert_eq!(policy.borrow_limit, 2);
        assert_eq!(policy.loan_period_days, 7);
    }
}
