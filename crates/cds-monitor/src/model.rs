//! Snapshot types returned by the CDS API.
//!
//! Only the fields the dashboard reads are modelled; everything else in the
//! payloads is ignored. Every field has a default so that partially filled
//! objects from older API versions still decode.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration key holding the web UI base URL.
pub const CONFIG_URL_UI_KEY: &str = "url.ui";

/// Service type used to list hatcheries.
pub const HATCHERY_SERVICE_TYPE: &str = "hatchery";

/// Job and worker statuses known to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    /// Queued, no worker yet.
    Waiting,
    /// Running on a worker.
    Building,
    /// Disabled.
    Disabled,
    /// Spawning or checking requirements.
    Checking,
    /// Finished successfully.
    Success,
    /// Finished with a failure.
    Fail,
}

impl Status {
    /// All known statuses.
    pub const ALL: [Self; 6] = [
        Self::Waiting,
        Self::Building,
        Self::Disabled,
        Self::Checking,
        Self::Success,
        Self::Fail,
    ];

    /// Wire name of the status.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting",
            Self::Building => "Building",
            Self::Disabled => "Disabled",
            Self::Checking => "Checking",
            Self::Success => "Success",
            Self::Fail => "Fail",
        }
    }

    /// Parse a wire name, `None` for anything unknown.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name/value pair attached to a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

impl Parameter {
    /// Build a string parameter.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "string".to_string(),
            value: value.into(),
        }
    }
}

/// Look up a parameter value, empty when absent.
pub fn param<'a>(params: &'a [Parameter], name: &str) -> &'a str {
    params
        .iter()
        .find(|p| p.name == name)
        .map_or("", |p| p.value.as_str())
}

/// Worker requirement declared by a job action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: String,
}

/// Action carried by an executed job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
}

/// Job as executed by a worker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedJob {
    #[serde(default)]
    pub action: Action,
    #[serde(default)]
    pub worker_name: String,
    #[serde(default)]
    pub worker_id: String,
}

/// Service (hatchery) that booked a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedBy {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Legacy pipeline build job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineBuildJob {
    pub id: i64,
    #[serde(default)]
    pub status: String,
    pub queued: DateTime<Utc>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub job: ExecutedJob,
    #[serde(default, rename = "bookedby")]
    pub booked_by: BookedBy,
}

/// Workflow node job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNodeJobRun {
    pub id: i64,
    #[serde(default)]
    pub status: String,
    pub queued: DateTime<Utc>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub job: ExecutedJob,
    #[serde(default, rename = "bookedby")]
    pub booked_by: BookedBy,
}

/// Worker registered on the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub hatchery_id: i64,
    #[serde(default)]
    pub hatchery_name: String,
}

/// Registered service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Current user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub admin: bool,
}

/// Health of a monitored component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LineStatus {
    Ok,
    Warn,
    Other(String),
}

impl From<String> for LineStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "OK" => Self::Ok,
            "WARN" => Self::Warn,
            _ => Self::Other(s),
        }
    }
}

impl From<LineStatus> for String {
    fn from(s: LineStatus) -> Self {
        s.to_string()
    }
}

impl fmt::Display for LineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Warn => f.write_str("WARN"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// One line of the global monitoring status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLine {
    #[serde(default)]
    pub component: String,
    pub status: LineStatus,
    #[serde(default, rename = "value")]
    pub message: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}: {}", self.status, self.component, self.message)
    }
}

/// Global monitoring status payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    #[serde(default)]
    pub lines: Vec<StatusLine>,
}
