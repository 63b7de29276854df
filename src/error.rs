use thiserror::Error;

/// Every way a catalog, lending or reporting call can fail.
///
/// The domain-rule variants (`NoCopiesAvailable`, `BorrowLimitExceeded`,
/// `NoActiveLoan`) are ordinary rejections that callers surface to the user.
/// `Storage`, `Io` and `Config` are infrastructure failures.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{message}")]
    Validation { message: String },

    #[error("{entity} {id} not found.")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Invalid patron ID: {patron_id:?}.")]
    InvalidPatron { patron_id: String },

    #[error("No copies of book {book_id} are currently available.")]
    NoCopiesAvailable { book_id: i64 },

    #[error("Patron {patron_id} has reached the maximum borrowing limit of {limit} books.")]
    BorrowLimitExceeded { patron_id: String, limit: u32 },

    #[error("No active loan of book {book_id} found for patron {patron_id}.")]
    NoActiveLoan { patron_id: String, book_id: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl LibraryError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LibraryError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        LibraryError::Config {
            message: message.into(),
        }
    }

    /// True for rejections caused by the caller's input or by a lending rule,
    /// as opposed to failures of the underlying store.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            LibraryError::Storage(_) | LibraryError::Io(_) | LibraryError::Config { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
