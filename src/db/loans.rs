use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::Result;
use crate::models::{Loan, LoanStatus, Money};

const LOAN_COLUMNS: &str = "id, patron_id, book_id, borrow_date, due_date, return_date, fee_cents";

fn loan_from_row(row: &Row<'_>) -> rusqlite::Result<Loan> {
    let return_date: Option<DateTime<Utc>> = row.get(5)?;
    let fee_cents: Option<i64> = row.get(6)?;
    Ok(Loan {
        id: row.get(0)?,
        patron_id: row.get(1)?,
        book_id: row.get(2)?,
        borrow_date: row.get(3)?,
        due_date: row.get(4)?,
        status: if return_date.is_some() {
            LoanStatus::Returned
        } else {
            LoanStatus::Outstanding
        },
        return_date,
        fee: fee_cents.map(Money::from_cents),
    })
}

pub(crate) fn insert_loan(
    conn: &Connection,
    patron_id: &str,
    book_id: i64,
    borrow_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
) -> Result<Loan> {
    conn.execute(
        "INSERT INTO loans (patron_id, book_id, borrow_date, due_date)
         VALUES (?1, ?2, ?3, ?4)",
        params![patron_id, book_id, borrow_date, due_date],
    )?;

    Ok(Loan {
        id: conn.last_insert_rowid(),
        patron_id: patron_id.to_string(),
        book_id,
        borrow_date,
        due_date,
        return_date: None,
        status: LoanStatus::Outstanding,
        fee: None,
    })
}

pub fn fetch_loan(conn: &Connection, id: i64) -> Result<Option<Loan>> {
    let loan = conn
        .query_row(
            &format!("SELECT {LOAN_COLUMNS} FROM loans WHERE id = ?1"),
            [id],
            loan_from_row,
        )
        .optional()?;
    Ok(loan)
}

/// The oldest open loan of `book_id` held by `patron_id`, if any.
pub fn fetch_outstanding_loan(
    conn: &Connection,
    patron_id: &str,
    book_id: i64,
) -> Result<Option<Loan>> {
    let loan = conn
        .query_row(
            &format!(
                "SELECT {LOAN_COLUMNS} FROM loans
                 WHERE patron_id = ?1 AND book_id = ?2 AND return_date IS NULL
                 ORDER BY borrow_date, id
                 LIMIT 1"
            ),
            params![patron_id, book_id],
            loan_from_row,
        )
        .optional()?;
    Ok(loan)
}

pub fn count_outstanding_loans(conn: &Connection, patron_id: &str) -> Result<u32> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE patron_id = ?1 AND return_date IS NULL",
        [patron_id],
        |row| row.get(0),
    )?)
}

/// Stamp the return date and assessed fee on an open loan. Returns the number
/// of rows touched, which is zero when the loan is missing or already closed.
pub(crate) fn close_loan(
    conn: &Connection,
    id: i64,
    return_date: DateTime<Utc>,
    fee: Money,
) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE loans SET return_date = ?1, fee_cents = ?2
         WHERE id = ?3 AND return_date IS NULL",
        params![return_date, fee.cents(), id],
    )?)
}

/// Every loan the patron ever had, oldest borrow first.
pub fn fetch_loans_for_patron(conn: &Connection, patron_id: &str) -> Result<Vec<Loan>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE patron_id = ?1 ORDER BY borrow_date, id"
    ))?;
    let loans = stmt
        .query_map([patron_id], loan_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(loans)
}
