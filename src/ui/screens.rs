use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::catalog::SearchField;
use crate::models::{Book, LoanStatus};
use crate::report::PatronReport;

use super::helpers::format_date;

/// Active catalog filter, mirrored from the search bar.
#[derive(Clone)]
pub(crate) struct SearchFilter {
    pub(crate) query: String,
    pub(crate) field: SearchField,
}

/// Book list shown on the main screen, already filtered by the catalog.
pub(crate) struct CatalogScreen {
    pub(crate) books: Vec<Book>,
    pub(crate) filter: Option<SearchFilter>,
    pub(crate) selected: usize,
}

impl CatalogScreen {
    pub(crate) fn new(books: Vec<Book>) -> Self {
        Self {
            books,
            filter: None,
            selected: 0,
        }
    }

    /// Swap in a fresh result set, keeping the selection on `focus_id` when it
    /// is still listed.
    pub(crate) fn replace_books(&mut self, books: Vec<Book>, focus_id: Option<i64>) {
        self.books = books;
        if let Some(id) = focus_id {
            if let Some(idx) = self.books.iter().position(|b| b.id == id) {
                self.selected = idx;
                return;
            }
        }
        self.ensure_in_bounds();
    }

    pub(crate) fn current_book(&self) -> Option<&Book> {
        self.books.get(self.selected)
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.books.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.books.len() - 1;
        self.selected = self.selected.saturating_add_signed(offset).min(last);
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.books.len().saturating_sub(1);
    }

    fn ensure_in_bounds(&mut self) {
        if self.selected >= self.books.len() {
            self.selected = self.books.len().saturating_sub(1);
        }
    }
}

/// Scrollable rendering of a patron report.
pub(crate) struct ReportScreen {
    pub(crate) report: PatronReport,
    pub(crate) scroll: u16,
}

impl ReportScreen {
    pub(crate) fn new(report: PatronReport) -> Self {
        Self { report, scroll: 0 }
    }

    pub(crate) fn scroll_by(&mut self, offset: i16) {
        self.scroll = self.scroll.saturating_add_signed(offset);
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        let heading = Style::default().add_modifier(Modifier::BOLD);
        let overdue = Style::default().fg(Color::Red);
        let report = &self.report;

        let mut lines = vec![
            Line::from(Span::styled(format!("Patron {}", report.patron_id), heading)),
            Line::from(format!(
                "Currently borrowed: {}    Fees owed (as of today): ${}    Fees assessed: ${}",
                report.currently_borrowed_count, report.total_fees_owed, report.total_fees_assessed
            )),
            Line::from(""),
            Line::from(Span::styled("Currently Borrowed", heading)),
        ];

        if report.currently_borrowed_books.is_empty() {
            lines.push(Line::from("  Nothing borrowed."));
        }
        for book in &report.currently_borrowed_books {
            let text = format!(
                "  #{} {}  due {}  fee ${}",
                book.book_id,
                book.title,
                format_date(book.due_date),
                book.current_fee
            );
            if book.days_overdue > 0 {
                lines.push(Line::from(Span::styled(
                    format!("{text}  ({} day(s) overdue)", book.days_overdue),
                    overdue,
                )));
            } else {
                lines.push(Line::from(text));
            }
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Borrowing History", heading)));
        if report.borrowing_history.is_empty() {
            lines.push(Line::from("  No loans on record."));
        }
        for entry in &report.borrowing_history {
            let returned = match (entry.status, entry.return_date) {
                (LoanStatus::Returned, Some(date)) => format!("returned {}", format_date(date)),
                _ => "not returned".to_string(),
            };
            lines.push(Line::from(format!(
                "  #{} {}  borrowed {}  due {}  {}  fee ${}",
                entry.book_id,
                entry.title,
                format_date(entry.borrow_date),
                format_date(entry.due_date),
                returned,
                entry.fee
            )));
        }

        lines
    }
}
