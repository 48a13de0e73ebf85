//! Terminal setup, the event loop, and teardown.
//!
//! The loop is single-threaded: draw, wait for one event, fold it into the
//! model, dispatch whatever commands fell out. Terminal input is pumped by a
//! blocking reader task; command completions arrive over the same channel,
//! so the model only ever changes in one place.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use ratatui::crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event as TermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::debug;

use traxdl_provider::provider::Provider;

use crate::command::CommandRunner;
use crate::event::Event;
use crate::model::Model;
use crate::view;

/// Run the UI until the model asks to quit, then hand the final model back
/// so the caller can report the outcome on a restored terminal.
pub async fn run(mut model: Model, provider: Arc<Provider>) -> Result<Model> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("entering alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;
    if let Ok(size) = terminal.size() {
        model.height = size.height;
    }

    let (tx, mut rx) = mpsc::channel::<Event>(256);
    let runner = CommandRunner::new(provider, tx.clone());

    // Terminal input pump. event::read() blocks, so it lives on a blocking
    // task and forwards over the channel; it winds down when the receiver
    // is dropped.
    let input_tx = tx.clone();
    tokio::task::spawn_blocking(move || loop {
        match event::read() {
            Ok(raw) => {
                let event = match raw {
                    TermEvent::Key(key) if key.kind != KeyEventKind::Release => Event::Key(key),
                    TermEvent::Paste(text) => Event::Paste(text),
                    TermEvent::Resize(_, height) => Event::Resize(height),
                    _ => continue,
                };
                if input_tx.blocking_send(event).is_err() {
                    break;
                }
            }
            Err(e) => {
                debug!("terminal input closed: {}", e);
                break;
            }
        }
    });

    if let Some(command) = model.init_command() {
        runner.dispatch(command);
    }

    let result = event_loop(&mut model, &mut terminal, &mut rx, &runner).await;

    // Teardown happens even when the loop failed, so the shell is usable
    // for the error report.
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )
    .context("leaving alternate screen")?;
    terminal.show_cursor().context("restoring cursor")?;

    result?;
    Ok(model)
}

async fn event_loop(
    model: &mut Model,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rx: &mut mpsc::Receiver<Event>,
    runner: &CommandRunner,
) -> Result<()> {
    loop {
        terminal
            .draw(|frame| view::draw(frame, model))
            .context("drawing frame")?;

        if model.should_quit {
            return Ok(());
        }

        let Some(event) = rx.recv().await else {
            // Every sender is gone; nothing can wake the loop again.
            return Ok(());
        };
        for command in model.update(event) {
            runner.dispatch(command);
        }
    }
}
