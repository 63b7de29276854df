use anyhow::Error;
use chrono::{DateTime, Utc};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};

use crate::models::Book;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

pub(crate) fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// "available/total" column text for a catalog row.
pub(crate) fn availability_label(book: &Book) -> String {
    format!("{}/{}", book.available_copies, book.total_copies)
}

/// Dim rows whose copies are all lent out.
pub(crate) fn availability_style(book: &Book) -> Style {
    if book.is_available() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::TimeZone;

    #[test]
    fn surface_error_prefers_root_cause() {
        let err = anyhow!("ISBN must be exactly 13 digits.").context("failed to add book");
        assert_eq!(surface_error(&err), "ISBN must be exactly 13 digits.");
    }

    #[test]
    fn dates_render_as_calendar_days() {
        let date = Utc.with_ymd_and_hms(2025, 7, 4, 23, 59, 0).unwrap();
        assert_eq!(format_date(date), "2025-07-04");
    }
}
