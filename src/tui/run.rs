use std::io;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossterm::event::{poll, read, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::debug;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::error::Result;
use crate::model::CommitSet;
use crate::retriever::CommitRetriever;

use super::events::{handle_key, Outcome};
use super::state::{App, Screen};
use super::views;

const TICK: Duration = Duration::from_millis(100);

/// Completion message posted by the fetch worker; stale generations are
/// dropped by the controller.
struct FetchResult {
    generation: u64,
    outcome: Result<CommitSet>,
}

/// Run the interactive session until the user quits.
///
/// One cooperative loop: draw, drain fetch completions, then process at most
/// one input event. Poll timeouts animate the loading spinner.
pub fn run(mut app: App, retriever: Arc<CommitRetriever>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let (tx, rx) = mpsc::channel::<FetchResult>();

    loop {
        terminal.draw(|f| views::draw(f, &app))?;

        while let Ok(result) = rx.try_recv() {
            app.on_fetch_complete(result.generation, result.outcome);
        }

        if poll(TICK)? {
            if let Event::Key(key) = read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut app, key) {
                    Outcome::Quit => break,
                    Outcome::StartFetch => spawn_fetch(&app, &retriever, &tx),
                    Outcome::Continue => {}
                }
            }
        } else if app.screen == Screen::Loading {
            app.tick_spinner();
        }
    }

    terminal.clear()?;
    disable_raw_mode()?;
    Ok(())
}

/// Launch the fetch off the event loop; it reports back with exactly one
/// message tagged with the generation it was started under.
fn spawn_fetch(app: &App, retriever: &Arc<CommitRetriever>, tx: &mpsc::Sender<FetchResult>) {
    let retriever = Arc::clone(retriever);
    let range = app.range;
    let generation = app.generation;
    let cancel = app.cancel.clone();
    let tx = tx.clone();

    debug!("spawning fetch for {} (generation {generation})", range.display());
    thread::spawn(move || {
        let outcome = retriever.fetch_range(&range, &cancel);
        // The receiver may be gone if the session quit; nothing to do then.
        let _ = tx.send(FetchResult { generation, outcome });
    });
}
