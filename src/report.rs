//! Per-patron status report: what is out now, what was borrowed before and
//! what is owed.
//!
//! `totalFeesOwed` is the fee each outstanding loan would incur if it were
//! returned at `now`. Fees already assessed on returned loans are reported
//! separately as `totalFeesAssessed`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Catalog;
use crate::db::Database;
use crate::error::{LibraryError, Result};
use crate::fees::FeeSchedule;
use crate::ledger::Ledger;
use crate::models::{Loan, LoanStatus, Money};
use crate::patrons::PatronRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatronReport {
    pub patron_id: String,
    pub currently_borrowed_books: Vec<BorrowedBook>,
    pub borrowing_history: Vec<HistoryEntry>,
    pub total_fees_owed: Money,
    pub total_fees_assessed: Money,
    pub currently_borrowed_count: usize,
}

/// An outstanding loan with its fee estimate as of the report time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBook {
    pub loan_id: i64,
    pub book_id: i64,
    pub title: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub days_overdue: i64,
    pub current_fee: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub loan_id: i64,
    pub book_id: i64,
    pub title: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub days_overdue: i64,
    /// Assessed fee for returned loans, running estimate otherwise.
    pub fee: Money,
}

pub struct StatusReporter {
    db: Database,
    patrons: Arc<dyn PatronRegistry>,
    fees: FeeSchedule,
}

impl StatusReporter {
    pub fn new(db: Database, patrons: Arc<dyn PatronRegistry>, fees: FeeSchedule) -> Self {
        Self { db, patrons, fees }
    }

    pub fn report(&self, patron_id: &str, now: DateTime<Utc>) -> Result<PatronReport> {
        if !self.patrons.is_recognized(patron_id) {
            return Err(LibraryError::InvalidPatron {
                patron_id: patron_id.to_string(),
            });
        }

        // A read transaction pins one snapshot for every query below.
        let mut conn = self.db.connect()?;
        let tx = conn.transaction()?;
        let catalog = Catalog::new(&tx);
        let loans = Ledger::new(&tx).history(patron_id)?;

        let mut titles: HashMap<i64, String> = HashMap::new();
        let mut currently_borrowed_books = Vec::new();
        let mut borrowing_history = Vec::with_capacity(loans.len());

        for loan in &loans {
            let title = match titles.get(&loan.book_id) {
                Some(title) => title.clone(),
                None => {
                    let title = catalog.get(loan.book_id)?.title;
                    titles.insert(loan.book_id, title.clone());
                    title
                }
            };

            let entry = self.history_entry(loan, title, now);
            if loan.is_outstanding() {
                currently_borrowed_books.push(BorrowedBook {
                    loan_id: loan.id,
                    book_id: loan.book_id,
                    title: entry.title.clone(),
                    borrow_date: loan.borrow_date,
                    due_date: loan.due_date,
                    days_overdue: entry.days_overdue,
                    current_fee: entry.fee,
                });
            }
            borrowing_history.push(entry);
        }

        let total_fees_owed: Money = currently_borrowed_books
            .iter()
            .map(|book| book.current_fee)
            .sum();
        let total_fees_assessed: Money = borrowing_history
            .iter()
            .filter(|entry| entry.status == LoanStatus::Returned)
            .map(|entry| entry.fee)
            .sum();

        tracing::debug!(
            patron_id,
            outstanding = currently_borrowed_books.len(),
            history = borrowing_history.len(),
            "patron report built"
        );

        Ok(PatronReport {
            patron_id: patron_id.to_string(),
            currently_borrowed_count: currently_borrowed_books.len(),
            currently_borrowed_books,
            borrowing_history,
            total_fees_owed,
            total_fees_assessed,
        })
    }

    fn history_entry(&self, loan: &Loan, title: String, now: DateTime<Utc>) -> HistoryEntry {
        let assessment = self.fees.assess(loan.due_date, loan.return_date.unwrap_or(now));
        HistoryEntry {
            loan_id: loan.id,
            book_id: loan.book_id,
            title,
            borrow_date: loan.borrow_date,
            due_date: loan.due_date,
            return_date: loan.return_date,
            status: loan.status,
            days_overdue: assessment.days_overdue,
            fee: loan.fee.unwrap_or(assessment.amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lending::{LendingEngine, LendingPolicy};
    use crate::patrons::CardNumberRegistry;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap()
    }

    fn setup() -> (tempfile::TempDir, Database, LendingEngine, StatusReporter) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("report.sqlite")).unwrap();
        let patrons: Arc<dyn PatronRegistry> = Arc::new(CardNumberRegistry::default());
        let engine = LendingEngine::new(db.clone(), Arc::clone(&patrons), LendingPolicy::default());
        let reporter = StatusReporter::new(db.clone(), patrons, FeeSchedule::default());
        (dir, db, engine, reporter)
    }

    #[test]
    fn patron_without_loans_gets_empty_report() {
        let (_dir, _db, _engine, reporter) = setup();
        let report = reporter.report("123456", now()).unwrap();
        assert!(report.currently_borrowed_books.is_empty());
        assert!(report.borrowing_history.is_empty());
        assert_eq!(report.total_fees_owed, Money::ZERO);
        assert_eq!(report.currently_borrowed_count, 0);
    }

    #[test]
    fn unknown_patron_is_rejected() {
        let (_dir, _db, _engine, reporter) = setup();
        assert!(matches!(
            reporter.report("abc", now()),
            Err(LibraryError::InvalidPatron { .. })
        ));
    }

    #[test]
    fn outstanding_fees_are_estimated_as_of_now() {
        let (_dir, db, engine, reporter) = setup();
        let conn = db.connect().unwrap();
        let catalog = Catalog::new(&conn);
        let overdue = catalog.add("Overdue", "A", "0000000000001", 1).unwrap();
        let fresh = catalog.add("Fresh", "B", "0000000000002", 1).unwrap();
        let returned = catalog.add("Returned", "C", "0000000000003", 1).unwrap();

        engine.borrow("123456", overdue.id, now()).unwrap();
        engine.borrow("123456", returned.id, now()).unwrap();
        engine
            .return_book("123456", returned.id, now() + Duration::days(16))
            .unwrap();
        engine
            .borrow("123456", fresh.id, now() + Duration::days(20))
            .unwrap();

        let report = reporter.report("123456", now() + Duration::days(22)).unwrap();
        assert_eq!(report.currently_borrowed_count, 2);
        assert_eq!(report.borrowing_history.len(), 3);

        let overdue_entry = report
            .currently_borrowed_books
            .iter()
            .find(|book| book.book_id == overdue.id)
            .unwrap();
        assert_eq!(overdue_entry.days_overdue, 8);
        assert_eq!(overdue_entry.current_fee, Money::from_cents(450));
        assert_eq!(overdue_entry.title, "Overdue");

        assert_eq!(report.total_fees_owed, Money::from_cents(450));
        assert_eq!(report.total_fees_assessed, Money::from_cents(100));

        let statuses: Vec<_> = report.borrowing_history.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            [LoanStatus::Outstanding, LoanStatus::Returned, LoanStatus::Outstanding]
        );
    }

    #[test]
    fn report_serializes_with_contract_field_names() {
        let (_dir, db, engine, reporter) = setup();
        let conn = db.connect().unwrap();
        let book = Catalog::new(&conn)
            .add("Dune", "Herbert", "1234567890123", 1)
            .unwrap();
        engine.borrow("123456", book.id, now()).unwrap();

        let report = reporter.report("123456", now()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["patronId"], "123456");
        assert_eq!(json["currentlyBorrowedCount"], 1);
        assert_eq!(json["totalFeesOwed"], "0.00");
        assert!(json["currentlyBorrowedBooks"][0]["dueDate"].is_string());
        assert_eq!(json["borrowingHistory"][0]["status"], "OUTSTANDING");
        assert!(json["borrowingHistory"][0]["returnDate"].is_null());
    }
}
