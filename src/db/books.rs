use rusqlite::{ffi, params, Connection, Error as SqlError, OptionalExtension, Row};

use crate::error::{LibraryError, Result};
use crate::models::Book;

const BOOK_COLUMNS: &str = "id, title, author, isbn, total_copies, available_copies";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        total_copies: row.get(4)?,
        available_copies: row.get(5)?,
    })
}

/// Insert a new book with every copy on the shelf, returning the hydrated
/// struct.
pub(crate) fn insert_book(
    conn: &Connection,
    title: &str,
    author: &str,
    isbn: &str,
    total_copies: u32,
) -> Result<Book> {
    conn.execute(
        "INSERT INTO books (title, author, isbn, total_copies, available_copies)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![title, author, isbn, total_copies],
    )
    .map_err(map_unique_isbn)?;

    Ok(Book {
        id: conn.last_insert_rowid(),
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        total_copies,
        available_copies: total_copies,
    })
}

pub fn fetch_book(conn: &Connection, id: i64) -> Result<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?1"),
            [id],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

pub fn fetch_book_by_isbn(conn: &Connection, isbn: &str) -> Result<Option<Book>> {
    let book = conn
        .query_row(
            &format!("SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?1"),
            [isbn],
            book_from_row,
        )
        .optional()?;
    Ok(book)
}

/// Every book in insertion order.
pub fn fetch_books(conn: &Connection) -> Result<Vec<Book>> {
    let mut stmt = conn.prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY id"))?;
    let books = stmt
        .query_map([], book_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(books)
}

pub fn count_books(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?)
}

/// Take one copy off the shelf. Fails with `NoCopiesAvailable` instead of
/// letting the count go negative.
pub(crate) fn decrement_available(conn: &Connection, id: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE books SET available_copies = available_copies - 1
         WHERE id = ?1 AND available_copies > 0",
        [id],
    )?;

    if updated == 0 {
        Err(LibraryError::NoCopiesAvailable { book_id: id })
    } else {
        Ok(())
    }
}

/// Put one copy back on the shelf, never exceeding the owned total.
pub(crate) fn increment_available(conn: &Connection, id: i64) -> Result<()> {
    let updated = conn.execute(
        "UPDATE books SET available_copies = MIN(total_copies, available_copies + 1)
         WHERE id = ?1",
        [id],
    )?;

    if updated == 0 {
        Err(LibraryError::NotFound {
            entity: "Book",
            id,
        })
    } else {
        Ok(())
    }
}

/// Coerce the ISBN uniqueness violation into a validation message. Any other
/// failure stays a storage error.
fn map_unique_isbn(err: SqlError) -> LibraryError {
    if let SqlError::SqliteFailure(failure, _) = &err {
        if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE {
            return LibraryError::validation("A book with this ISBN already exists.");
        }
    }
    err.into()
}
