//! The surface external callers (the terminal front-end, tests, any future
//! request handler) use. Each call opens its own connection, so one
//! `Library` can be shared across threads.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{Catalog, SearchField};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::db::Database;
use crate::error::Result;
use crate::lending::{LendingEngine, LendingPolicy, ReturnReceipt};
use crate::models::{Book, Loan, Money};
use crate::patrons::{registry_from_settings, PatronRegistry};
use crate::report::{PatronReport, StatusReporter};
use crate::seed;

pub struct Library {
    db: Database,
    engine: LendingEngine,
    reporter: StatusReporter,
    clock: Arc<dyn Clock>,
}

impl Library {
    pub fn new(
        db: Database,
        patrons: Arc<dyn PatronRegistry>,
        policy: LendingPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let reporter = StatusReporter::new(db.clone(), Arc::clone(&patrons), policy.fees.clone());
        let engine = LendingEngine::new(db.clone(), patrons, policy);
        Self {
            db,
            engine,
            reporter,
            clock,
        }
    }

    /// Wire up the store, patron registry and policy described by `settings`
    /// against the wall clock.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let db = Database::open(settings.database_path()?)?;
        let patrons: Arc<dyn PatronRegistry> = Arc::from(registry_from_settings(&settings.patrons));
        Ok(Self::new(
            db,
            patrons,
            LendingPolicy::from(settings),
            Arc::new(SystemClock),
        ))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn add_book(&self, title: &str, author: &str, isbn: &str, total_copies: i64) -> Result<Book> {
        let conn = self.db.connect()?;
        Catalog::new(&conn).add(title, author, isbn, total_copies)
    }

    pub fn get_book(&self, book_id: i64) -> Result<Book> {
        let conn = self.db.connect()?;
        Catalog::new(&conn).get(book_id)
    }

    pub fn list_books(&self) -> Result<Vec<Book>> {
        let conn = self.db.connect()?;
        Catalog::new(&conn).list()
    }

    /// Search by a field name as received from outside ("title", "author" or
    /// "isbn"). Unknown names are a validation error.
    pub fn search_books(&self, query: &str, field: &str) -> Result<Vec<Book>> {
        let field: SearchField = field.parse()?;
        self.search_books_by(query, field)
    }

    pub fn search_books_by(&self, query: &str, field: SearchField) -> Result<Vec<Book>> {
        let conn = self.db.connect()?;
        Catalog::new(&conn).search(query, field)
    }

    pub fn borrow_book(&self, patron_id: &str, book_id: i64, now: DateTime<Utc>) -> Result<Loan> {
        self.engine.borrow(patron_id, book_id, now)
    }

    pub fn return_book(
        &self,
        patron_id: &str,
        book_id: i64,
        now: DateTime<Utc>,
    ) -> Result<ReturnReceipt> {
        self.engine.return_book(patron_id, book_id, now)
    }

    pub fn calculate_late_fee(&self, due_date: DateTime<Utc>, return_date: DateTime<Utc>) -> Money {
        self.engine.policy().fees.assess(due_date, return_date).amount
    }

    pub fn patron_status_report(&self, patron_id: &str, now: DateTime<Utc>) -> Result<PatronReport> {
        self.reporter.report(patron_id, now)
    }

    /// Insert the sample catalog when no book exists yet.
    pub fn seed_if_empty(&self) -> Result<usize> {
        let conn = self.db.connect()?;
        seed::seed_if_empty(&Catalog::new(&conn))
    }
}
