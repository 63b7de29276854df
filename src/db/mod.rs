//! Persistence module split across logical submodules.
//!
//! Only reads are exported. Copy counts cannot be adjusted from outside the
//! crate:
//!
//! ```compile_fail
//! fn take_copy(conn: &rusqlite::Connection) {
//!     let _ = library_lending_tracker::db::decrement_available(conn, 1);
//! }
//! ```

mod books;
mod connection;
mod loans;

pub use books::{count_books, fetch_book, fetch_book_by_isbn, fetch_books};
pub use connection::Database;
pub use loans::{count_outstanding_loans, fetch_loan, fetch_loans_for_patron, fetch_outstanding_loan};

pub(crate) use books::{decrement_available, increment_available, insert_book};
pub(crate) use loans::{close_loan, insert_loan};
