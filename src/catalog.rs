//! Catalog store: validated book creation plus read access (lookup, listing
//! and search). The available-copy count is only ever changed by the lending
//! engine.

use std::fmt;
use std::str::FromStr;

use rusqlite::Connection;

use crate::db;
use crate::error::{LibraryError, Result};
use crate::models::Book;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_AUTHOR_LEN: usize = 100;
pub const ISBN_LEN: usize = 13;

/// Field a catalog search is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// Case-insensitive substring.
    Title,
    /// Case-insensitive substring.
    Author,
    /// Exact match.
    Isbn,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::Title, SearchField::Author, SearchField::Isbn];

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchField::Title => "title",
            SearchField::Author => "author",
            SearchField::Isbn => "isbn",
        }
    }

    /// Next field in `ALL`, wrapping around.
    pub fn cycle(self) -> Self {
        match self {
            SearchField::Title => SearchField::Author,
            SearchField::Author => SearchField::Isbn,
            SearchField::Isbn => SearchField::Title,
        }
    }

    fn matches(&self, book: &Book, query: &str) -> bool {
        match self {
            SearchField::Title => contains_ignore_case(&book.title, query),
            SearchField::Author => contains_ignore_case(&book.author, query),
            SearchField::Isbn => book.isbn == query,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        SearchField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                LibraryError::validation(format!(
                    "Unknown search field {name:?}. Expected title, author or isbn."
                ))
            })
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Read/create access to the books table over a borrowed connection, so the
/// same code runs standalone or inside a lending transaction.
pub struct Catalog<'c> {
    conn: &'c Connection,
}

impl<'c> Catalog<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Validate and insert a new book. All copies start out available.
    pub fn add(&self, title: &str, author: &str, isbn: &str, total_copies: i64) -> Result<Book> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::validation("Title is required."));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(LibraryError::validation(format!(
                "Title must be at most {MAX_TITLE_LEN} characters."
            )));
        }

        let author = author.trim();
        if author.is_empty() {
            return Err(LibraryError::validation("Author is required."));
        }
        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err(LibraryError::validation(format!(
                "Author must be at most {MAX_AUTHOR_LEN} characters."
            )));
        }

        if isbn.len() != ISBN_LEN || !isbn.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LibraryError::validation("ISBN must be exactly 13 digits."));
        }

        let total_copies = u32::try_from(total_copies)
            .ok()
            .filter(|copies| *copies >= 1)
            .ok_or_else(|| LibraryError::validation("Total copies must be a positive integer."))?;

        if db::fetch_book_by_isbn(self.conn, isbn)?.is_some() {
            return Err(LibraryError::validation("A book with this ISBN already exists."));
        }

        let book = db::insert_book(self.conn, title, author, isbn, total_copies)?;
        tracing::info!(book_id = book.id, isbn = %book.isbn, "added \"{}\" to the catalog", book.title);
        Ok(book)
    }

    pub fn get(&self, book_id: i64) -> Result<Book> {
        db::fetch_book(self.conn, book_id)?.ok_or(LibraryError::NotFound {
            entity: "Book",
            id: book_id,
        })
    }

    /// All books in insertion order.
    pub fn list(&self) -> Result<Vec<Book>> {
        db::fetch_books(self.conn)
    }

    /// Filter the catalog. A blank query returns the full catalog.
    pub fn search(&self, query: &str, field: SearchField) -> Result<Vec<Book>> {
        let books = self.list()?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(books);
        }

        Ok(books
            .into_iter()
            .filter(|book| field.matches(book, query))
            .collect())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(db::count_books(self.conn)? == 0)
    }
}
