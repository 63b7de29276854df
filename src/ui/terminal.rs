use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{self as term, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Longest wait for input before the next redraw.
const TICK: Duration = Duration::from_millis(250);

/// Take over the terminal, run the lending UI until the user quits, then put
/// the terminal back even when the loop failed.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut terminal = enter_terminal()?;
    let outcome = event_loop(&mut terminal, app);
    restore_terminal(&mut terminal)?;
    outcome
}

fn enter_terminal() -> Result<Tui> {
    term::enable_raw_mode().context("could not switch the terminal to raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("could not open the alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("could not initialise the terminal")
}

fn event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("could not draw the screen")?;

        if !event::poll(TICK).context("could not poll for input")? {
            continue;
        }
        let Event::Key(key) = event::read().context("could not read input")? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if is_interrupt(&key) || app.handle_key(key.code)? {
            return Ok(());
        }
    }
}

/// Raw mode swallows SIGINT, so Ctrl+C arrives as an ordinary key.
fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    term::disable_raw_mode().context("could not leave raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("could not close the alternate screen")?;
    terminal.show_cursor().context("could not show the cursor")
}
