//! Event handling for the monitoring dashboard

use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::app::{DashboardState, Focus, NoticeLevel};
use crate::aggregate::QueueTab;
use crate::data::{PlatformSnapshot, QueueSnapshot};

/// Shortcut help shown with `h`.
pub const HELP: &str = "shortcuts: ⇥ to select panel, esc to deselect panel, ↑ and ↓ to select line, ← and → to change filters, ↩ to open in ui";

/// Application events
#[derive(Debug)]
pub enum AppEvent {
    /// Terminal key press
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Redraw tick
    Tick,
    /// Data update from the poller
    Data(DataEvent),
}

/// Completed fetches. Errors are carried as display text.
#[derive(Debug, Clone)]
pub enum DataEvent {
    Platform(Result<PlatformSnapshot, String>),
    Queue(Result<QueueSnapshot, String>),
}

/// Side effects requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The queue tab changed; refetch the queue right away.
    ReloadQueue(QueueTab),
    /// Open a URL in the browser.
    OpenUrl(String),
}

/// Event handler that polls for terminal events
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventHandler {
    /// Start reading terminal events, emitting a tick every `tick_rate`.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        // Detached so that quitting never waits on a blocking poll.
        thread::spawn(move || {
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate.saturating_sub(last_tick.elapsed());
                if event::poll(timeout).unwrap_or(false) {
                    let forwarded = match event::read() {
                        Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                            event_tx.send(AppEvent::Key(key))
                        }
                        Ok(Event::Resize(w, h)) => event_tx.send(AppEvent::Resize(w, h)),
                        _ => Ok(()),
                    };
                    if forwarded.is_err() {
                        break;
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    if event_tx.send(AppEvent::Tick).is_err() {
                        break;
                    }
                    last_tick = Instant::now();
                }
            }
        });

        Self { rx, tx }
    }

    /// Next event, `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }

    /// Sender for other producers, such as the poller.
    pub fn sender(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.tx.clone()
    }
}

/// Handle keyboard input
pub fn handle_key(app: &mut DashboardState, key: KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            app.running = false;
            None
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
            None
        }
        KeyCode::Char('h') => {
            app.set_notice(NoticeLevel::Info, HELP);
            None
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_focus();
            None
        }
        KeyCode::Esc => {
            app.focus = Focus::None;
            None
        }
        KeyCode::Up => {
            app.move_up();
            None
        }
        KeyCode::Down => {
            app.move_down();
            None
        }
        KeyCode::Left => app.prev_tab().map(Command::ReloadQueue),
        KeyCode::Right => app.next_tab().map(Command::ReloadQueue),
        KeyCode::Enter if app.focus == Focus::Queue => app
            .current_job_url()
            .map(|url| Command::OpenUrl(url.to_string())),
        KeyCode::Enter => None,
        other => {
            app.set_notice(NoticeLevel::Info, format!("No command for {other:?}"));
            None
        }
    }
}
