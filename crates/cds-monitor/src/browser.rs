//! Opening drill-down links in the user's browser.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{MonitorError, MonitorResult};

/// Something that can show a URL to the user.
pub trait BrowserLauncher {
    /// Open `url`. Returns once the launcher is started, not when the page
    /// is shown.
    fn open(&self, url: &str) -> MonitorResult<()>;
}

/// Launches the platform's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

/// Program and arguments used to open a URL on this platform.
pub fn launcher_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(target_os = "windows") {
        (
            "cmd",
            vec!["/C".into(), "start".into(), String::new(), url.to_string()],
        )
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> MonitorResult<()> {
        let (program, args) = launcher_command(url);
        debug!(program, url, "Opening browser");
        Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
            .map_err(|e| MonitorError::Browser {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}
