//! Loan ledger: storage and lookup of loan records. Loans are opened and
//! closed only by the lending engine, inside its transaction.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::db;
use crate::error::{LibraryError, Result};
use crate::models::{Loan, Money};

pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 14;

/// Loan records over a borrowed connection. Reads are open to any caller;
/// opening and closing loans belongs to the lending engine.
///
/// ```compile_fail
/// use library_lending_tracker::ledger::Ledger;
///
/// fn open_loan_directly(conn: &rusqlite::Connection) {
///     let _ = Ledger::new(conn).create("123456", 1, chrono::Utc::now());
/// }
/// ```
pub struct Ledger<'c> {
    conn: &'c Connection,
    loan_period: Duration,
}

impl<'c> Ledger<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self::with_loan_period(conn, DEFAULT_LOAN_PERIOD_DAYS)
    }

    pub fn with_loan_period(conn: &'c Connection, days: u32) -> Self {
        Self {
            conn,
            loan_period: Duration::days(i64::from(days)),
        }
    }

    /// Open a loan due one loan period after `borrow_date`.
    pub(crate) fn create(&self, patron_id: &str, book_id: i64, borrow_date: DateTime<Utc>) -> Result<Loan> {
        let due_date = borrow_date + self.loan_period;
        db::insert_loan(self.conn, patron_id, book_id, borrow_date, due_date)
    }

    pub fn get(&self, loan_id: i64) -> Result<Loan> {
        db::fetch_loan(self.conn, loan_id)?.ok_or(LibraryError::NotFound {
            entity: "Loan",
            id: loan_id,
        })
    }

    /// The open loan of `book_id` held by `patron_id`. Fails with `NotFound`
    /// (carrying the book id) when there is none.
    pub fn find_outstanding(&self, patron_id: &str, book_id: i64) -> Result<Loan> {
        db::fetch_outstanding_loan(self.conn, patron_id, book_id)?.ok_or(LibraryError::NotFound {
            entity: "Outstanding loan for book",
            id: book_id,
        })
    }

    pub fn count_outstanding(&self, patron_id: &str) -> Result<u32> {
        db::count_outstanding_loans(self.conn, patron_id)
    }

    /// Move an outstanding loan to RETURNED. A loan can be closed once; a
    /// second attempt, or an unknown id, is `NotFound`.
    pub(crate) fn close(&self, loan_id: i64, return_date: DateTime<Utc>, fee: Money) -> Result<Loan> {
        let loan = self.get(loan_id)?;
        if !loan.is_outstanding() {
            return Err(LibraryError::NotFound {
                entity: "Outstanding loan",
                id: loan_id,
            });
        }
        if return_date < loan.borrow_date {
            return Err(LibraryError::validation(
                "Return date cannot be earlier than the borrow date.",
            ));
        }

        if db::close_loan(self.conn, loan_id, return_date, fee)? == 0 {
            return Err(LibraryError::NotFound {
                entity: "Outstanding loan",
                id: loan_id,
            });
        }
        self.get(loan_id)
    }

    /// Every loan of the patron, any status, oldest borrow first.
    pub fn history(&self, patron_id: &str) -> Result<Vec<Loan>> {
        db::fetch_loans_for_patron(self.conn, patron_id)
    }
}
