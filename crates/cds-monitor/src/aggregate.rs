//! Turns raw API snapshots into display-ready structures.
//!
//! Every function here is pure: it takes a snapshot and returns a new
//! value, which the dashboard swaps in wholesale.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::{
    param, BookedBy, ExecutedJob, LineStatus, Parameter, PipelineBuildJob, Service, Status,
    StatusLine, Worker, WorkflowNodeJobRun,
};

/// Name of the bucket collecting workers without a known hatchery.
pub const WITHOUT_HATCHERY: &str = "Without hatchery";

/// Queue filter selected with left/right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueTab {
    #[default]
    Waiting,
    Building,
    Both,
}

impl QueueTab {
    /// Next tab, wrapping forward.
    pub const fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Building,
            Self::Building => Self::Both,
            Self::Both => Self::Waiting,
        }
    }

    /// Previous tab, wrapping backward.
    pub const fn prev(self) -> Self {
        match self {
            Self::Waiting => Self::Both,
            Self::Building => Self::Waiting,
            Self::Both => Self::Building,
        }
    }

    /// Statuses shown on this tab, in title order.
    pub const fn statuses(self) -> &'static [Status] {
        match self {
            Self::Waiting => &[Status::Waiting],
            Self::Building => &[Status::Building],
            Self::Both => &[Status::Building, Status::Waiting],
        }
    }

    /// True when `status` belongs to this tab.
    pub fn accepts(self, status: &str) -> bool {
        self.statuses().iter().any(|s| s.as_str() == status)
    }
}

/// One line of the unified queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub id: i64,
    pub is_workflow_job: bool,
    pub status: String,
    pub queued_at: DateTime<Utc>,
    pub booked_by_name: String,
    pub booked_by_id: i64,
    pub worker_name: String,
    pub worker_id: String,
    pub project: String,
    pub workflow_or_pipeline: String,
    pub node: String,
    pub triggered_by: String,
    pub requirements: Vec<(String, String)>,
    pub parameters: Vec<Parameter>,
}

impl QueueRow {
    fn build(
        is_workflow_job: bool,
        id: i64,
        status: &str,
        queued_at: DateTime<Utc>,
        parameters: &[Parameter],
        job: &ExecutedJob,
        booked_by: &BookedBy,
    ) -> Self {
        let project = param(parameters, "cds.project").to_string();
        let (workflow_or_pipeline, node) = if is_workflow_job {
            (
                param(parameters, "cds.workflow").to_string(),
                param(parameters, "cds.node").to_string(),
            )
        } else {
            (
                param(parameters, "cds.pipeline").to_string(),
                format!(
                    "{}/{}",
                    param(parameters, "git.branch"),
                    param(parameters, "cds.environment")
                ),
            )
        };
        Self {
            id,
            is_workflow_job,
            status: status.to_string(),
            queued_at,
            booked_by_name: booked_by.name.clone(),
            booked_by_id: booked_by.id,
            worker_name: job.worker_name.clone(),
            worker_id: job.worker_id.clone(),
            project,
            workflow_or_pipeline,
            node,
            triggered_by: param(parameters, "cds.triggered_by.username").to_string(),
            requirements: job
                .action
                .requirements
                .iter()
                .map(|r| (r.kind.clone(), r.value.clone()))
                .collect(),
            parameters: parameters.to_vec(),
        }
    }

    /// Row from a legacy pipeline build job.
    pub fn from_legacy(job: &PipelineBuildJob) -> Self {
        Self::build(
            false,
            job.id,
            &job.status,
            job.queued,
            &job.parameters,
            &job.job,
            &job.booked_by,
        )
    }

    /// Row from a workflow node job run.
    pub fn from_workflow(job: &WorkflowNodeJobRun) -> Self {
        Self::build(
            true,
            job.id,
            &job.status,
            job.queued,
            &job.parameters,
            &job.job,
            &job.booked_by,
        )
    }

    /// Time spent in the queue as of `now`; zero for clock skew.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.queued_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Web UI deep link for this row.
    ///
    /// Missing parameters are left empty; the link is not validated.
    pub fn drill_down_url(&self, base_url: &str) -> String {
        let p = |name: &str| param(&self.parameters, name);
        let base = base_url.trim_end_matches('/');
        if self.is_workflow_job {
            format!(
                "{base}/project/{}/workflow/{}/run/{}",
                p("cds.project"),
                p("cds.workflow"),
                p("cds.run.number"),
            )
        } else {
            format!(
                "{base}/project/{}/application/{}/pipeline/{}/build/{}?envName={}&branch={}&version={}",
                p("cds.project"),
                p("cds.application"),
                p("cds.pipeline"),
                p("cds.buildNumber"),
                query_escape(p("cds.environment")),
                query_escape(p("git.branch")),
                p("cds.version"),
            )
        }
    }
}

fn query_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Unified queue for `tab`: legacy rows first, then workflow rows, each in
/// the order the API returned them.
pub fn build_queue_rows(
    legacy: &[PipelineBuildJob],
    workflow: &[WorkflowNodeJobRun],
    tab: QueueTab,
) -> Vec<QueueRow> {
    legacy
        .iter()
        .filter(|job| tab.accepts(&job.status))
        .map(QueueRow::from_legacy)
        .chain(
            workflow
                .iter()
                .filter(|job| tab.accepts(&job.status))
                .map(QueueRow::from_workflow),
        )
        .collect()
}

/// Longest time any of `rows` has been queued.
pub fn max_queued<'a>(rows: impl IntoIterator<Item = &'a QueueRow>, now: DateTime<Utc>) -> Duration {
    rows.into_iter()
        .map(|row| row.age(now))
        .max()
        .unwrap_or(Duration::ZERO)
}

/// Worker counts of one hatchery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HatcheryBucket {
    pub name: String,
    pub counts_by_status: BTreeMap<String, u64>,
}

impl HatcheryBucket {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counts_by_status: BTreeMap::new(),
        }
    }

    /// Total workers in the bucket.
    pub fn total(&self) -> u64 {
        self.counts_by_status.values().sum()
    }
}

/// Group workers by hatchery, sorted by hatchery name.
///
/// Hatchery services seed empty buckets only for admins, who are the only
/// users allowed to list them.
pub fn build_hatchery_buckets(
    workers: &[Worker],
    services: &[Service],
    is_admin: bool,
) -> Vec<HatcheryBucket> {
    let mut buckets: BTreeMap<&str, HatcheryBucket> = BTreeMap::new();
    if is_admin {
        for service in services {
            buckets
                .entry(service.name.as_str())
                .or_insert_with(|| HatcheryBucket::new(&service.name));
        }
    }
    buckets.insert(WITHOUT_HATCHERY, HatcheryBucket::new(WITHOUT_HATCHERY));

    for worker in workers {
        let name = if worker.hatchery_name.is_empty() {
            WITHOUT_HATCHERY
        } else {
            worker.hatchery_name.as_str()
        };
        *buckets
            .entry(name)
            .or_insert_with(|| HatcheryBucket::new(name))
            .counts_by_status
            .entry(worker.status.clone())
            .or_default() += 1;
    }

    buckets.into_values().collect()
}

/// Worker totals by status across every bucket.
pub fn worker_totals(buckets: &[HatcheryBucket]) -> BTreeMap<String, u64> {
    let mut totals = BTreeMap::new();
    for bucket in buckets {
        for (status, count) in &bucket.counts_by_status {
            *totals.entry(status.clone()).or_default() += count;
        }
    }
    totals
}

/// Keep warnings, errors and `Global` components.
pub fn filter_status_lines(lines: &[StatusLine]) -> Vec<StatusLine> {
    lines
        .iter()
        .filter(|l| l.status != LineStatus::Ok || l.component.contains("Global"))
        .cloned()
        .collect()
}
