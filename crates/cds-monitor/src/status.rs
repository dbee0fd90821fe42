//! Status classification: icons, color tags and wait urgency.

use std::time::Duration;

use crate::model::Status;

/// Waits longer than this are shown as a warning.
pub const WARNING_WAIT: Duration = Duration::from_secs(15);

/// Waits longer than this are shown as critical.
pub const CRITICAL_WAIT: Duration = Duration::from_secs(60);

/// Terminal-independent color class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTag {
    Default,
    Cyan,
    Blue,
    Grey,
    Yellow,
    Green,
    Red,
}

/// How long a job has been waiting, in display tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Urgency {
    Default,
    Warning,
    Critical,
}

impl Urgency {
    /// Color used for the age column.
    pub const fn color(self) -> ColorTag {
        match self {
            Self::Default => ColorTag::Default,
            Self::Warning => ColorTag::Yellow,
            Self::Critical => ColorTag::Red,
        }
    }
}

/// Map a status string to its short icon and color.
///
/// Unknown statuses come back unchanged with [`ColorTag::Default`].
pub fn classify(status: &str) -> (String, ColorTag) {
    match Status::parse(status) {
        Some(known) => {
            let (icon, color) = classify_known(known);
            (icon.to_string(), color)
        }
        None => (status.to_string(), ColorTag::Default),
    }
}

/// Icon and color of a known status.
pub const fn classify_known(status: Status) -> (&'static str, ColorTag) {
    match status {
        Status::Waiting => ("w", ColorTag::Cyan),
        Status::Building => ("b", ColorTag::Blue),
        Status::Disabled => ("d", ColorTag::Grey),
        Status::Checking => ("c", ColorTag::Yellow),
        Status::Success => ("s", ColorTag::Green),
        Status::Fail => ("f", ColorTag::Red),
    }
}

/// Urgency tier of a wait duration.
pub fn urgency(waited: Duration) -> Urgency {
    if waited > CRITICAL_WAIT {
        Urgency::Critical
    } else if waited > WARNING_WAIT {
        Urgency::Warning
    } else {
        Urgency::Default
    }
}
