use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::catalog::ISBN_LEN;
use crate::models::Book;

/// Internal representation of the "add book" form fields.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) isbn: String,
    pub(crate) copies: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form, in tab order.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Isbn,
    Copies,
}

impl BookField {
    pub(crate) const ALL: [BookField; 4] = [
        BookField::Title,
        BookField::Author,
        BookField::Isbn,
        BookField::Copies,
    ];

    pub(crate) fn label(&self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Isbn => "ISBN",
            BookField::Copies => "Copies",
        }
    }

    fn next(self) -> Self {
        match self {
            BookField::Title => BookField::Author,
            BookField::Author => BookField::Isbn,
            BookField::Isbn => BookField::Copies,
            BookField::Copies => BookField::Title,
        }
    }

    fn previous(self) -> Self {
        match self {
            BookField::Title => BookField::Copies,
            BookField::Author => BookField::Title,
            BookField::Isbn => BookField::Author,
            BookField::Copies => BookField::Isbn,
        }
    }
}

impl BookForm {
    /// Start with one copy pre-filled, the common case.
    pub(crate) fn new() -> Self {
        Self {
            copies: "1".to_string(),
            ..Self::default()
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    /// Append a character to the active field. ISBN and copies only take
    /// digits, and the ISBN stops at thirteen.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            BookField::Title => push_printable(&mut self.title, ch),
            BookField::Author => push_printable(&mut self.author, ch),
            BookField::Isbn => {
                if ch.is_ascii_digit() && self.isbn.len() < ISBN_LEN {
                    self.isbn.push(ch);
                    true
                } else {
                    false
                }
            }
            BookField::Copies => {
                if ch.is_ascii_digit() {
                    self.copies.push(ch);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Parse the copy count. Everything else is validated by the catalog so
    /// the form and the store report the same messages.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String, i64)> {
        let copies_raw = self.copies.trim();
        if copies_raw.is_empty() {
            return Err(anyhow!("Total copies is required."));
        }
        let copies = copies_raw
            .parse::<i64>()
            .map_err(|_| anyhow!("Total copies must be a positive integer."))?;
        Ok((
            self.title.clone(),
            self.author.clone(),
            self.isbn.clone(),
            copies,
        ))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: BookField) -> Line<'static> {
        let value = self.value(field);
        let is_active = self.active == field;

        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.to_string()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    pub(crate) fn value_len(&self, field: BookField) -> usize {
        self.value(field).chars().count()
    }

    fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Isbn => &self.isbn,
            BookField::Copies => &self.copies,
        }
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Isbn => &mut self.isbn,
            BookField::Copies => &mut self.copies,
        }
    }
}

fn push_printable(target: &mut String, ch: char) -> bool {
    if ch.is_control() {
        false
    } else {
        target.push(ch);
        true
    }
}

/// What a patron prompt does once the ID is confirmed.
#[derive(Clone)]
pub(crate) enum PatronAction {
    Borrow { book_id: i64, title: String },
    Return { book_id: i64, title: String },
    Report,
}

impl PatronAction {
    pub(crate) fn borrow(book: &Book) -> Self {
        PatronAction::Borrow {
            book_id: book.id,
            title: book.title.clone(),
        }
    }

    pub(crate) fn return_of(book: &Book) -> Self {
        PatronAction::Return {
            book_id: book.id,
            title: book.title.clone(),
        }
    }

    pub(crate) fn title(&self) -> String {
        match self {
            PatronAction::Borrow { title, .. } => format!("Borrow \"{title}\""),
            PatronAction::Return { title, .. } => format!("Return \"{title}\""),
            PatronAction::Report => "Patron Status Report".to_string(),
        }
    }
}

/// Single-field prompt asking for a patron ID.
#[derive(Clone)]
pub(crate) struct PatronPrompt {
    pub(crate) action: PatronAction,
    pub(crate) patron_id: String,
    pub(crate) error: Option<String>,
}

impl PatronPrompt {
    /// Pre-fill with the last patron used so repeated lending is quick.
    pub(crate) fn new(action: PatronAction, last_patron: Option<&str>) -> Self {
        Self {
            action,
            patron_id: last_patron.unwrap_or_default().to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_ascii_alphanumeric() {
            self.patron_id.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.patron_id.pop();
    }

    pub(crate) fn patron_id(&self) -> Result<&str> {
        let trimmed = self.patron_id.trim();
        if trimmed.is_empty() {
            Err(anyhow!("Patron ID is required."))
        } else {
            Ok(trimmed)
        }
    }
}
