pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use tasker::config::Config;
use tasker::dates::now_local;
use tasker::models::Field;
use tasker::storage::TaskStore;
use app::{App, InputField, InputMode};
use ui::ui;

/// Upper bound on how long the loop blocks on input, so the midnight
/// deadline is noticed even when no key is pressed.
const TICK: Duration = Duration::from_secs(1);

pub fn run_tui(store: TaskStore, config: Config) -> tasker::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, config);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = app.rollover.remaining(now_local()).min(TICK);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app.input_mode {
                    InputMode::Normal => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Down | KeyCode::Char('j') => app.next(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous(),
                        KeyCode::Char(' ') => app.complete_selected(),
                        KeyCode::Char('s') => app.cycle_status_selected(),
                        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
                        KeyCode::Char('a') => app.start_add(),
                        KeyCode::Char('n') => app.start_edit(InputField::Title),
                        KeyCode::Char('e') => app.start_edit(InputField::Task(Field::Details)),
                        KeyCode::Char('t') => app.start_edit_date(),
                        KeyCode::Char('l') => app.start_edit(InputField::Task(Field::Location)),
                        KeyCode::Char('m') => app.start_edit(InputField::Task(Field::Image)),
                        KeyCode::Char('p') => app.start_edit(InputField::Priority),
                        KeyCode::Char('c') => app.toggle_completed(),
                        KeyCode::Char('f') => app.cycle_filter(),
                        KeyCode::Char('v') => app.toggle_view(),
                        KeyCode::Char('x') => app.export(),
                        KeyCode::Char('i') => app.start_import(),
                        KeyCode::Char('r') => app.reload(),
                        _ => {}
                    },
                    InputMode::Editing | InputMode::Adding => match key.code {
                        KeyCode::Enter => app.handle_input(),
                        KeyCode::Esc => app.cancel_input(),
                        KeyCode::Char(c) => {
                            app.input_buffer.push(c);
                        }
                        KeyCode::Backspace => {
                            app.input_buffer.pop();
                        }
                        _ => {}
                    },
                }
            }
        }

        app.on_tick(now_local());
    }
}
