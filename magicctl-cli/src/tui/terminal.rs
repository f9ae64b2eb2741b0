//! Terminal management and main run loop

use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use magicctl_core::{MagicConfig, RemoteGateway, User};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::app::{App, HandleResult};
use super::ui;
use crate::commands::users_view;

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Run the interactive users browser
pub async fn run_browse(config: &MagicConfig) -> Result<()> {
    let mut app = App::new(users_view(config, None)?);

    let mut terminal = init_terminal()?;
    let result = run_loop(&mut terminal, &mut app).await;

    // Restore terminal (even if loop failed)
    restore_terminal(&mut terminal)?;

    result
}

/// Redraw after every key press and every list update
async fn run_loop<G>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App<G>,
) -> Result<()>
where
    G: RemoteGateway<Row = User, Detail = Vec<String>>,
{
    let mut events = EventStream::new();
    app.view.mount();

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) == HandleResult::Quit {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("Failed to read terminal event"),
                None => break,
            },
            _ = app.view.next_update() => app.sync(),
        }
    }

    Ok(())
}
