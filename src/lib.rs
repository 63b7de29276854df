//! Library lending tracker: a catalog of books with finite copy counts and a
//! ledger of patron loans with borrowing limits, due dates, late fees and
//! per-patron status reports, stored in an embedded SQLite database.
//!
//! `Library` is the entry point external callers use. The terminal
//! front-end in `ui` is one such caller.
pub mod catalog;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod lending;
pub mod library;
pub mod locks;
pub mod logging;
pub mod models;
pub mod patrons;
pub mod report;
pub mod seed;
pub mod ui;

pub use catalog::SearchField;
pub use config::Settings;
pub use error::{LibraryError, Result};
pub use fees::{compute_fee, FeeAssessment, FeeSchedule};
pub use lending::{LendingPolicy, ReturnReceipt};
pub use library::Library;

/// The domain types that other layers manipulate.
pub use models::{Book, Loan, LoanStatus, Money};

pub use report::{BorrowedBook, HistoryEntry, PatronReport};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
