//! cds-monitor - CDS Terminal UI
//!
//! Live monitoring of a CDS platform: queue, hatcheries and status.
//! Read-only apart from opening jobs in the web UI.

use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, EnvFilter};

use cds_monitor::aggregate::QueueTab;
use cds_monitor::app::{DashboardState, NoticeLevel};
use cds_monitor::browser::{BrowserLauncher, SystemBrowser};
use cds_monitor::data::{HttpApi, Poller};
use cds_monitor::demo::DemoApi;
use cds_monitor::events::{handle_key, AppEvent, Command, EventHandler};
use cds_monitor::{ui, MonitorConfig};

#[derive(Parser)]
#[command(name = "cds-monitor")]
#[command(about = "CDS Terminal UI - live queue, worker and service monitoring")]
#[command(version)]
struct Cli {
    /// CDS API URL
    #[arg(long, env = "CDS_API_URL", default_value = "http://localhost:8081")]
    host: String,

    /// CDS username, used to check admin rights
    #[arg(long, env = "CDS_USER")]
    user: Option<String>,

    /// CDS session token
    #[arg(long, env = "CDS_SESSION_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Data refresh interval in seconds
    #[arg(long, default_value = "2")]
    refresh_interval: u64,

    /// Redraw interval in seconds
    #[arg(long, default_value = "1")]
    render_interval: u64,

    /// Timeout of each API request in seconds
    #[arg(long, default_value = "10")]
    request_timeout: u64,

    /// Write logs to this file (the terminal is taken by the dashboard)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable demo mode with fake data
    #[arg(long)]
    demo: bool,
}

impl Cli {
    fn config(&self) -> MonitorConfig {
        MonitorConfig::new(self.host.clone())
            .with_username(self.user.clone())
            .with_session_token(self.token.clone())
            .with_refresh_interval(Duration::from_secs(self.refresh_interval))
            .with_render_interval(Duration::from_secs(self.render_interval))
            .with_request_timeout(Duration::from_secs(self.request_timeout))
    }
}

/// Raw mode and alternate screen, restored on drop.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(io::sink),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(EnvFilter::from_default_env().add_directive("cds_monitor=debug".parse()?))
        .init();
    Ok(())
}

/// Text printed once the terminal is restored after a panic.
fn crash_report(thread: Option<&str>, info: &dyn std::fmt::Display) -> String {
    format!(
        "cds-monitor crashed :(\nthread '{}' {info}",
        thread.unwrap_or("<unnamed>")
    )
}

/// A panic on any thread, the poller task included, is fatal: leave the
/// alternate screen, print the report and exit.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        println!("{}", crash_report(std::thread::current().name(), panic_info));
        std::process::exit(101);
    }));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_ref())?;

    let config = cli.config();
    config.validate()?;

    install_panic_hook();
    let mut guard = TerminalGuard::new()?;

    info!(api = %config.api_url, demo = cli.demo, "Starting monitoring");
    let result = run_app(&mut guard.terminal, &config, cli.demo).await;
    drop(guard);
    info!("Monitoring stopped");

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: &MonitorConfig,
    demo: bool,
) -> anyhow::Result<()> {
    let mut app = DashboardState::new();
    let mut event_handler = EventHandler::new(config.render_interval);
    let (tab_tx, tab_rx) = watch::channel(QueueTab::default());

    // Start data polling in background
    let tx = event_handler.sender();
    let refresh = config.refresh_interval;
    if demo {
        tokio::spawn(Poller::new(DemoApi::new(), tx, tab_rx).run(refresh));
    } else {
        let api = HttpApi::new(config)?;
        tokio::spawn(Poller::new(api, tx, tab_rx).run(refresh));
    }

    let browser = SystemBrowser;

    // Main loop
    while app.running {
        app.refresh_view(Utc::now());
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        let Some(event) = event_handler.next().await else {
            break;
        };
        match event {
            AppEvent::Key(key) => match handle_key(&mut app, key) {
                Some(Command::ReloadQueue(tab)) => {
                    let _ = tab_tx.send(tab);
                }
                Some(Command::OpenUrl(url)) => {
                    if let Err(err) = browser.open(&url) {
                        warn!(error = %err, "Cannot open browser");
                        app.set_notice(NoticeLevel::Error, err.to_string());
                    }
                }
                None => {}
            },
            AppEvent::Data(data_event) => app.apply_data_event(data_event),
            AppEvent::Resize(_, _) | AppEvent::Tick => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crash_report_names_the_thread() {
        let report = crash_report(Some("tokio-runtime-worker"), &"panicked at src/data.rs:1:1");
        assert_eq!(
            report,
            "cds-monitor crashed :(\nthread 'tokio-runtime-worker' panicked at src/data.rs:1:1"
        );
        assert!(crash_report(None, &"boom").contains("'<unnamed>'"));
    }

    #[test]
    fn cli_builds_valid_config() {
        let cli = Cli::parse_from(["cds-monitor", "--host", "https://api.cds", "--refresh-interval", "5"]);
        let config = cli.config();
        assert_eq!(config.api_url, "https://api.cds");
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }
}
