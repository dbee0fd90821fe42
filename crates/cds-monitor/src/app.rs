//! Dashboard state.
//!
//! Owned by the event loop and mutated only there: key handlers call the
//! cursor/tab methods, completed fetches go through
//! [`DashboardState::apply_data_event`], and [`DashboardState::refresh_view`]
//! rebuilds the queue lines before every draw so that ages keep advancing
//! between two fetches.

use chrono::{DateTime, Utc};
use ratatui::widgets::Borders;
use tracing::{debug, warn};

use crate::aggregate::{
    build_hatchery_buckets, build_queue_rows, filter_status_lines, max_queued, worker_totals,
    HatcheryBucket, QueueTab,
};
use crate::config::DEFAULT_UI_URL;
use crate::data::{Latencies, PlatformSnapshot, QueueSnapshot};
use crate::events::DataEvent;
use crate::format;
use crate::model::{PipelineBuildJob, Status, StatusLine, WorkflowNodeJobRun};
use crate::status::classify;
use crate::ui;
use crate::widgets::ScrollableList;

/// Panel receiving arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    None,
    Queue,
}

/// Severity of a one-shot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// One-shot message replacing the latency line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Main dashboard state
#[derive(Debug)]
pub struct DashboardState {
    /// Is the app running
    pub running: bool,

    /// Panel receiving arrow keys
    pub focus: Focus,

    queue_tab: QueueTab,
    base_url: String,
    is_admin: bool,

    legacy_jobs: Vec<PipelineBuildJob>,
    workflow_jobs: Vec<WorkflowNodeJobRun>,
    status_lines: Vec<StatusLine>,
    buckets: Vec<HatcheryBucket>,

    /// Queue panel
    pub queue: ScrollableList,
    /// Filtered global status, display only
    pub status: ScrollableList,
    /// Workers per hatchery, display only
    pub hatcheries: ScrollableList,

    current_job_url: Option<String>,
    latencies: Latencies,
    notice: Option<Notice>,

    /// Last successful platform refresh
    pub last_update: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        let loading = || vec![ui::loading_line()];
        let mut queue = ScrollableList::new(" Queue ");
        queue.set_items(loading());
        let mut status = ScrollableList::new(" Status ");
        status.set_items(loading());
        let mut hatcheries =
            ScrollableList::new(" Hatcheries ").with_borders(Borders::TOP | Borders::LEFT);
        hatcheries.set_items(loading());

        Self {
            running: true,
            focus: Focus::Queue,
            queue_tab: QueueTab::default(),
            base_url: DEFAULT_UI_URL.to_string(),
            is_admin: false,
            legacy_jobs: Vec::new(),
            workflow_jobs: Vec::new(),
            status_lines: Vec::new(),
            buckets: Vec::new(),
            queue,
            status,
            hatcheries,
            current_job_url: None,
            latencies: Latencies::default(),
            notice: None,
            last_update: None,
        }
    }

    pub const fn queue_tab(&self) -> QueueTab {
        self.queue_tab
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Drill-down URL of the queue row under the cursor.
    pub fn current_job_url(&self) -> Option<&str> {
        self.current_job_url.as_deref()
    }

    pub fn buckets(&self) -> &[HatcheryBucket] {
        &self.buckets
    }

    pub fn status_lines(&self) -> &[StatusLine] {
        &self.status_lines
    }

    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::None => Focus::Queue,
            Focus::Queue => Focus::None,
        };
    }

    pub fn move_up(&mut self) {
        if self.focus == Focus::Queue {
            self.queue.cursor_up();
        }
    }

    pub fn move_down(&mut self) {
        if self.focus == Focus::Queue {
            self.queue.cursor_down();
        }
    }

    /// Cycle the queue tab backward. Returns the new tab when it changed.
    pub fn prev_tab(&mut self) -> Option<QueueTab> {
        (self.focus == Focus::Queue).then(|| {
            self.queue_tab = self.queue_tab.prev();
            self.queue_tab
        })
    }

    /// Cycle the queue tab forward. Returns the new tab when it changed.
    pub fn next_tab(&mut self) -> Option<QueueTab> {
        (self.focus == Focus::Queue).then(|| {
            self.queue_tab = self.queue_tab.next();
            self.queue_tab
        })
    }

    /// Update state from a completed fetch.
    ///
    /// On error only the message line changes; every panel keeps what it
    /// showed before.
    pub fn apply_data_event(&mut self, event: DataEvent) {
        match event {
            DataEvent::Platform(Ok(snapshot)) => self.apply_platform(snapshot),
            DataEvent::Queue(Ok(snapshot)) => self.apply_queue(snapshot),
            DataEvent::Platform(Err(msg)) | DataEvent::Queue(Err(msg)) => {
                warn!(error = %msg, "Fetch failed");
                self.set_notice(NoticeLevel::Error, msg);
            }
        }
    }

    fn apply_platform(&mut self, snapshot: PlatformSnapshot) {
        if let Some(url) = snapshot.ui_url {
            self.base_url = url;
        }
        self.is_admin = snapshot.user.admin;
        self.buckets = build_hatchery_buckets(&snapshot.workers, &snapshot.services, self.is_admin);
        self.status_lines = filter_status_lines(&snapshot.status_lines);
        self.legacy_jobs = snapshot.legacy_jobs;

        self.latencies.status = snapshot.status_latency;
        self.latencies.workers = snapshot.workers_latency;
        self.latencies.worker_models = snapshot.worker_models_latency;
        self.latencies.queue_count = snapshot.queue_count_latency;

        self.status
            .set_items(self.status_lines.iter().map(ui::status_line).collect());
        self.hatcheries
            .set_items(self.buckets.iter().map(ui::hatchery_line).collect());
        self.hatcheries.set_label(hatcheries_label(&self.buckets));

        self.notice = None;
        self.last_update = Some(Utc::now());
    }

    fn apply_queue(&mut self, snapshot: QueueSnapshot) {
        if snapshot.tab != self.queue_tab {
            debug!(fetched = ?snapshot.tab, current = ?self.queue_tab, "Dropping stale queue snapshot");
            return;
        }
        self.workflow_jobs = snapshot.jobs;
        self.latencies.queue = snapshot.latency;
    }

    /// Rebuild the queue panel and border styling as of `now`.
    pub fn refresh_view(&mut self, now: DateTime<Utc>) {
        self.queue.set_focused(self.focus == Focus::Queue);
        self.queue.set_cursor_visibility(self.focus == Focus::Queue);

        let rows = build_queue_rows(&self.legacy_jobs, &self.workflow_jobs, self.queue_tab);
        self.queue.set_header(ui::queue_header());
        self.queue
            .set_items(rows.iter().map(|row| ui::queue_line(row, now)).collect());

        self.current_job_url = self
            .queue
            .cursor()
            .and_then(|cursor| rows.get(cursor))
            .map(|row| row.drill_down_url(&self.base_url));

        let statuses = self.queue_tab.statuses();
        let names: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let mut label = format!(" Queue({}):{} ", names.join(","), rows.len());
        for status in statuses {
            let max = max_queued(rows.iter().filter(|r| r.status == status.as_str()), now);
            let title = match status {
                Status::Building => "Max Building",
                _ => "Max Waiting",
            };
            label.push_str(&format!("- {title}:{} ", format::age(max)));
        }
        self.queue.set_label(label);
    }

    /// Text of the shared message line.
    pub fn message_text(&self) -> String {
        match &self.notice {
            Some(notice) => notice.text.clone(),
            None => latency_line(&self.latencies),
        }
    }
}

/// Latency annotations of the latest fetches.
pub fn latency_line(latencies: &Latencies) -> String {
    format!(
        "count queue wf {} | queue wf {} | workers {} | wModels {} | status {}",
        format::latency(latencies.queue_count),
        format::latency(latencies.queue),
        format::latency(latencies.workers),
        format::latency(latencies.worker_models),
        format::latency(latencies.status),
    )
}

/// Panel title with worker totals per status.
pub fn hatcheries_label(buckets: &[HatcheryBucket]) -> String {
    let mut label = " Hatcheries ".to_string();
    for (status, count) in worker_totals(buckets) {
        let (icon, _) = classify(&status);
        label.push_str(&format!("{count}{icon} "));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LineStatus, Parameter, Service, User, Worker};
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_100, 0).single().unwrap()
    }

    fn job(id: i64, status: &str, run: &str) -> WorkflowNodeJobRun {
        WorkflowNodeJobRun {
            id,
            status: status.to_string(),
            queued: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
            parameters: vec![
                Parameter::new("cds.project", "PRJ"),
                Parameter::new("cds.workflow", "wf"),
                Parameter::new("cds.run.number", run),
            ],
            job: Default::default(),
            booked_by: Default::default(),
        }
    }

    fn platform() -> PlatformSnapshot {
        PlatformSnapshot {
            ui_url: Some("https://ui.example".into()),
            user: User { username: "bob".into(), admin: true },
            status_lines: vec![
                StatusLine { component: "Global/Version".into(), status: LineStatus::Ok, message: "1".into() },
                StatusLine { component: "DB".into(), status: LineStatus::Ok, message: "ok".into() },
                StatusLine { component: "Cache".into(), status: LineStatus::Warn, message: "slow".into() },
            ],
            workers: vec![Worker {
                status: "Building".into(),
                hatchery_name: "swarm".into(),
                ..Worker::default()
            }],
            services: vec![Service { name: "marathon".into(), ..Service::default() }],
            workers_latency: Duration::from_millis(12),
            ..PlatformSnapshot::default()
        }
    }

    fn queue(jobs: Vec<WorkflowNodeJobRun>) -> DataEvent {
        DataEvent::Queue(Ok(QueueSnapshot {
            tab: QueueTab::Waiting,
            jobs,
            latency: Duration::from_millis(5),
        }))
    }

    #[test]
    fn platform_snapshot_fills_panels() {
        let mut app = DashboardState::new();
        app.apply_data_event(DataEvent::Platform(Ok(platform())));
        assert_eq!(app.base_url(), "https://ui.example");
        assert_eq!(app.status_lines().len(), 2);
        assert_eq!(app.status.len(), 2);
        let names: Vec<&str> = app.buckets().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Without hatchery", "marathon", "swarm"]);
        assert_eq!(app.hatcheries.label(), " Hatcheries 1b ");
        assert!(app.last_update.is_some());
    }

    #[test]
    fn fetch_error_only_touches_message_line() {
        let mut app = DashboardState::new();
        app.apply_data_event(DataEvent::Platform(Ok(platform())));
        app.apply_data_event(queue(vec![job(1, "Waiting", "3")]));
        app.refresh_view(now());

        let queue_before = app.queue.items().to_vec();
        let hatcheries_before = app.hatcheries.items().to_vec();
        let status_before = app.status.items().to_vec();

        app.apply_data_event(DataEvent::Platform(Err("/mon/status: HTTP 500: boom".into())));
        app.refresh_view(now());

        assert_eq!(app.queue.items(), queue_before.as_slice());
        assert_eq!(app.hatcheries.items(), hatcheries_before.as_slice());
        assert_eq!(app.status.items(), status_before.as_slice());
        assert_eq!(app.message_text(), "/mon/status: HTTP 500: boom");
        assert_eq!(app.notice().map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[test]
    fn successful_refresh_clears_notice() {
        let mut app = DashboardState::new();
        app.set_notice(NoticeLevel::Error, "boom");
        app.apply_data_event(DataEvent::Platform(Ok(platform())));
        assert!(app.notice().is_none());
        assert!(app.message_text().starts_with("count queue wf 0s | queue wf 0s | workers 12ms"));
    }

    #[test]
    fn drill_down_follows_cursor() {
        let mut app = DashboardState::new();
        app.apply_data_event(DataEvent::Platform(Ok(platform())));
        app.apply_data_event(queue(vec![job(1, "Waiting", "3"), job(2, "Waiting", "4")]));
        app.refresh_view(now());
        assert_eq!(app.current_job_url(), Some("https://ui.example/project/PRJ/workflow/wf/run/3"));

        app.move_down();
        app.refresh_view(now());
        assert_eq!(app.current_job_url(), Some("https://ui.example/project/PRJ/workflow/wf/run/4"));
    }

    #[test]
    fn cursor_index_reused_after_refresh() {
        let mut app = DashboardState::new();
        app.apply_data_event(queue(vec![job(1, "Waiting", "1"), job(2, "Waiting", "2"), job(3, "Waiting", "3")]));
        app.refresh_view(now());
        app.move_down();
        app.refresh_view(now());
        assert!(app.current_job_url().is_some_and(|u| u.ends_with("/run/2")));

        // Job 1 left the queue: index 1 now holds job 3.
        app.apply_data_event(queue(vec![job(2, "Waiting", "2"), job(3, "Waiting", "3")]));
        app.refresh_view(now());
        assert_eq!(app.queue.cursor(), Some(1));
        assert!(app.current_job_url().is_some_and(|u| u.ends_with("/run/3")));
    }

    #[test]
    fn queue_label_shows_count_and_max_wait() {
        let mut app = DashboardState::new();
        app.apply_data_event(queue(vec![job(1, "Waiting", "1"), job(2, "Building", "2")]));
        app.refresh_view(now());
        assert_eq!(app.queue.label(), " Queue(Waiting):1 - Max Waiting:1m40s ");

        app.next_tab();
        app.next_tab();
        app.refresh_view(now());
        assert_eq!(
            app.queue.label(),
            " Queue(Building,Waiting):2 - Max Building:1m40s - Max Waiting:1m40s "
        );
    }

    #[test]
    fn queue_snapshot_for_previous_tab_is_dropped() {
        let mut app = DashboardState::new();
        app.apply_data_event(queue(vec![job(1, "Waiting", "1")]));
        app.next_tab();

        // Fetched for Waiting, arrives after the switch to Building.
        app.apply_data_event(queue(vec![job(2, "Waiting", "2"), job(3, "Waiting", "3")]));
        app.next_tab();
        app.refresh_view(now());
        assert_eq!(app.queue.len(), 1);

        app.apply_data_event(DataEvent::Queue(Ok(QueueSnapshot {
            tab: QueueTab::Both,
            jobs: vec![job(4, "Building", "4"), job(5, "Waiting", "5")],
            latency: Duration::from_millis(9),
        })));
        app.refresh_view(now());
        assert_eq!(app.queue.len(), 2);
        assert!(app.message_text().contains("queue wf 9ms"));
    }

    #[test]
    fn empty_queue_has_no_url() {
        let mut app = DashboardState::new();
        app.apply_data_event(queue(Vec::new()));
        app.refresh_view(now());
        assert!(app.queue.is_empty());
        assert!(app.current_job_url().is_none());
    }

    #[test]
    fn focus_drives_border() {
        let mut app = DashboardState::new();
        app.refresh_view(now());
        assert!(app.queue.is_focused());
        app.toggle_focus();
        app.refresh_view(now());
        assert!(!app.queue.is_focused());
        assert!(app.next_tab().is_none());
    }
}
