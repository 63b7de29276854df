use std::mem;

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use crate::catalog::SearchField;
use crate::library::Library;
use crate::models::Book;

use super::forms::{BookField, BookForm, PatronAction, PatronPrompt};
use super::helpers::{
    availability_label, availability_style, centered_rect, format_date, surface_error,
};
use super::screens::{CatalogScreen, ReportScreen, SearchFilter};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE: isize = 10;

/// High-level navigation states.
enum Screen {
    Catalog,
    Report(ReportScreen),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    PromptingPatron(PatronPrompt),
    Searching(SearchState),
}

/// State for an active inline search.
struct SearchState {
    query: String,
    field: SearchField,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    library: Library,
    catalog: CatalogScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    last_patron: Option<String>,
}

impl App {
    pub fn new(library: Library) -> Result<Self> {
        let books = library.list_books().context("failed to load catalog")?;
        Ok(Self {
            library,
            catalog: CatalogScreen::new(books),
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
            last_patron: None,
        })
    }

    /// Dispatch a key press. Returns `true` once the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_add_book(code, form)?,
            Mode::PromptingPatron(prompt) => self.handle_patron_prompt(code, prompt)?,
            Mode::Searching(state) => self.handle_search(code, state)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        if let Screen::Report(ref mut report) = self.screen {
            let mut back_to_catalog = false;
            match code {
                KeyCode::Char('q') => *exit = true,
                KeyCode::Esc => back_to_catalog = true,
                KeyCode::Up => report.scroll_by(-1),
                KeyCode::Down => report.scroll_by(1),
                KeyCode::PageUp => report.scroll_by(-(PAGE as i16)),
                KeyCode::PageDown => report.scroll_by(PAGE as i16),
                _ => {}
            }
            if back_to_catalog {
                self.screen = Screen::Catalog;
                self.clear_status();
            }
            return Ok(Mode::Normal);
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.catalog.move_selection(-1),
            KeyCode::Down => self.catalog.move_selection(1),
            KeyCode::PageUp => self.catalog.move_selection(-PAGE),
            KeyCode::PageDown => self.catalog.move_selection(PAGE),
            KeyCode::Home => self.catalog.select_first(),
            KeyCode::End => self.catalog.select_last(),
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Char('A') => {
                self.clear_status();
                return Ok(Mode::AddingBook(BookForm::new()));
            }
            KeyCode::Char('/') => {
                self.clear_status();
                let state = match &self.catalog.filter {
                    Some(filter) => SearchState {
                        query: filter.query.clone(),
                        field: filter.field,
                    },
                    None => SearchState {
                        query: String::new(),
                        field: SearchField::Title,
                    },
                };
                return Ok(Mode::Searching(state));
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                return Ok(self.prompt_for_selected(PatronAction::borrow));
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                return Ok(self.prompt_for_selected(PatronAction::return_of));
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.clear_status();
                return Ok(Mode::PromptingPatron(PatronPrompt::new(
                    PatronAction::Report,
                    self.last_patron.as_deref(),
                )));
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if self.catalog.filter.take().is_some() {
                    self.reload_catalog(None)?;
                    self.set_status("Search cleared.", StatusKind::Info);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn prompt_for_selected(&mut self, action: fn(&Book) -> PatronAction) -> Mode {
        match self.catalog.current_book() {
            Some(book) => {
                let action = action(book);
                self.clear_status();
                Mode::PromptingPatron(PatronPrompt::new(action, self.last_patron.as_deref()))
            }
            None => {
                self.set_status("No book selected.", StatusKind::Error);
                Mode::Normal
            }
        }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add book cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.save_new_book(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingBook(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_patron_prompt(&mut self, code: KeyCode, mut prompt: PatronPrompt) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                prompt.backspace();
                Ok(Mode::PromptingPatron(prompt))
            }
            KeyCode::Enter => match self.run_patron_action(&prompt) {
                Ok(()) => Ok(Mode::Normal),
                Err(err) => {
                    let message = surface_error(&err);
                    prompt.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                    Ok(Mode::PromptingPatron(prompt))
                }
            },
            KeyCode::Char(ch) => {
                if prompt.push_char(ch) {
                    prompt.error = None;
                }
                Ok(Mode::PromptingPatron(prompt))
            }
            _ => Ok(Mode::PromptingPatron(prompt)),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.catalog.filter = None;
                self.reload_catalog(None)?;
                return Ok(Mode::Normal);
            }
            KeyCode::Enter => return Ok(Mode::Normal),
            KeyCode::Up => {
                self.catalog.move_selection(-1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Down => {
                self.catalog.move_selection(1);
                return Ok(Mode::Searching(state));
            }
            KeyCode::Tab => state.field = state.field.cycle(),
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) => {
                if !ch.is_control() {
                    state.query.push(ch);
                }
            }
            _ => return Ok(Mode::Searching(state)),
        }

        self.catalog.filter = Some(SearchFilter {
            query: state.query.clone(),
            field: state.field,
        });
        let focus = self.catalog.current_book().map(|book| book.id);
        self.reload_catalog(focus)?;
        Ok(Mode::Searching(state))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, content_area),
            Screen::Report(report) => self.draw_report(frame, content_area, report),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, form),
            Mode::PromptingPatron(prompt) => self.draw_patron_prompt(frame, area, prompt),
            Mode::Searching(state) => self.draw_search_bar(frame, area, state),
            Mode::Normal => {}
        }
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.catalog.filter {
            Some(filter) if !filter.query.trim().is_empty() => format!(
                "Catalog - {} matching {} \"{}\"",
                self.catalog.books.len(),
                filter.field,
                filter.query.trim()
            ),
            _ => format!("Catalog - {} books", self.catalog.books.len()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.catalog.books.is_empty() {
            let paragraph = Paragraph::new("No books to show. Press [a] to add one.")
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items: Vec<ListItem> = self
            .catalog
            .books
            .iter()
            .map(|book| {
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:>4}  ", book.id), Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("{:<40}", book.title), availability_style(book)),
                    Span::raw(format!("{:<28}", book.author)),
                    Span::raw(format!("{}  ", book.isbn)),
                    Span::styled(availability_label(book), availability_style(book)),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.catalog.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_report(&self, frame: &mut Frame, area: Rect, report: &ReportScreen) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Patron Status Report");
        let paragraph = Paragraph::new(report.lines())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((report.scroll, 0));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::AddingBook(_)) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            (_, Mode::PromptingPatron(_)) => &[("[Enter]", " Confirm   "), ("[Esc]", " Cancel")],
            (_, Mode::Searching(_)) => &[
                ("[Tab]", " Field   "),
                ("[↑↓]", " Navigate   "),
                ("[Enter]", " Keep filter   "),
                ("[Esc]", " Clear"),
            ],
            (Screen::Report(_), _) => &[
                ("[↑↓]", " Scroll   "),
                ("[Esc]", " Back   "),
                ("[q]", " Quit"),
            ],
            (Screen::Catalog, _) => &[
                ("[↑↓]", " Navigate   "),
                ("[a]", " Add   "),
                ("[b]", " Borrow   "),
                ("[r]", " Return   "),
                ("[p]", " Patron report   "),
                ("[/]", " Search   "),
                ("[c]", " Clear search   "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let prefix = format!("Search {}: ", state.field);
        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("{prefix}{}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prefix.len() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, form: &BookForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Book").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = BookField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch field • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let row = BookField::ALL
            .iter()
            .position(|field| *field == form.active)
            .unwrap_or(0) as u16;
        let prefix = form.active.label().len() as u16 + 2;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + row,
        ));
    }

    fn draw_patron_prompt(&self, frame: &mut Frame, area: Rect, prompt: &PatronPrompt) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(prompt.action.title())
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            Line::from(format!("Patron ID: {}", prompt.patron_id)),
            Line::from(""),
        ];
        match &prompt.error {
            Some(error) => lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            ))),
            None => lines.push(Line::from(Span::styled(
                "Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            ))),
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
        let cursor_x = inner.x + "Patron ID: ".len() as u16 + prompt.patron_id.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let (title, author, isbn, copies) = form.parse_inputs()?;
        let book = self.library.add_book(&title, &author, &isbn, copies)?;
        self.reload_catalog(Some(book.id))?;
        self.set_status(
            format!("Book \"{}\" has been added to the catalog.", book.title),
            StatusKind::Info,
        );
        Ok(())
    }

    fn run_patron_action(&mut self, prompt: &PatronPrompt) -> Result<()> {
        let patron_id = prompt.patron_id()?.to_string();
        let now = self.library.now();

        match &prompt.action {
            PatronAction::Borrow { book_id, title } => {
                let loan = self.library.borrow_book(&patron_id, *book_id, now)?;
                self.reload_catalog(Some(*book_id))?;
                self.set_status(
                    format!(
                        "Successfully borrowed \"{title}\". Due date: {}.",
                        format_date(loan.due_date)
                    ),
                    StatusKind::Info,
                );
            }
            PatronAction::Return { book_id, title } => {
                let receipt = self.library.return_book(&patron_id, *book_id, now)?;
                self.reload_catalog(Some(*book_id))?;
                let message = if receipt.fee.amount.is_zero() {
                    format!("Successfully returned \"{title}\".")
                } else {
                    format!(
                        "Successfully returned \"{title}\". A late fee of ${} applies for {} day(s) overdue.",
                        receipt.fee.amount, receipt.fee.days_overdue
                    )
                };
                self.set_status(message, StatusKind::Info);
            }
            PatronAction::Report => {
                let report = self.library.patron_status_report(&patron_id, now)?;
                self.screen = Screen::Report(ReportScreen::new(report));
                self.clear_status();
            }
        }

        self.last_patron = Some(patron_id);
        Ok(())
    }

    /// Re-query the catalog through the active filter, if any.
    fn reload_catalog(&mut self, focus_id: Option<i64>) -> Result<()> {
        let books = match &self.catalog.filter {
            Some(filter) => self.library.search_books_by(&filter.query, filter.field)?,
            None => self.library.list_books()?,
        };
        self.catalog.replace_books(books, focus_id);
        Ok(())
    }
}
