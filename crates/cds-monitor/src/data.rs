//! Data client for fetching CDS monitoring snapshots.
//!
//! [`MonitoringApi`] is the seam to the remote API; [`HttpApi`] implements it
//! over HTTP. The [`Poller`] runs on its own task, times every call, and
//! posts complete snapshots to the event loop. A failed group of calls never
//! produces a partial snapshot: the event loop receives either the whole
//! snapshot or the error text.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::aggregate::QueueTab;
use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::events::{AppEvent, DataEvent};
use crate::model::{
    MonitoringStatus, PipelineBuildJob, Service, Status, StatusLine, User, Worker,
    WorkflowNodeJobRun, CONFIG_URL_UI_KEY, HATCHERY_SERVICE_TYPE,
};

/// Read-only view of the CDS API used by the dashboard.
pub trait MonitoringApi: Send + Sync + 'static {
    /// Web UI base URL, if the API exposes one.
    fn ui_url(&self) -> impl Future<Output = MonitorResult<Option<String>>> + Send;

    /// Current user; carries the admin flag.
    fn current_user(&self) -> impl Future<Output = MonitorResult<User>> + Send;

    /// Global monitoring status lines.
    fn global_status(&self) -> impl Future<Output = MonitorResult<Vec<StatusLine>>> + Send;

    /// Registered workers.
    fn workers(&self) -> impl Future<Output = MonitorResult<Vec<Worker>>> + Send;

    /// Services of the given type. Admin only.
    fn services_by_type(&self, kind: &str) -> impl Future<Output = MonitorResult<Vec<Service>>> + Send;

    /// Number of worker models.
    fn worker_models_count(&self) -> impl Future<Output = MonitorResult<usize>> + Send;

    /// Legacy pipeline build jobs.
    fn legacy_queue(&self) -> impl Future<Output = MonitorResult<Vec<PipelineBuildJob>>> + Send;

    /// Workflow node job runs with one of `statuses`.
    fn workflow_queue(
        &self,
        statuses: &[Status],
    ) -> impl Future<Output = MonitorResult<Vec<WorkflowNodeJobRun>>> + Send;

    /// Number of workflow jobs in the queue.
    fn workflow_queue_count(&self) -> impl Future<Output = MonitorResult<u64>> + Send;
}

/// Wall-clock time of each timed call, from the latest completed fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latencies {
    pub queue_count: Duration,
    pub queue: Duration,
    pub workers: Duration,
    pub worker_models: Duration,
    pub status: Duration,
}

/// Everything but the workflow queue, fetched on each refresh tick.
#[derive(Debug, Clone, Default)]
pub struct PlatformSnapshot {
    /// Only set the first time the URL is obtained.
    pub ui_url: Option<String>,
    pub user: User,
    pub status_lines: Vec<StatusLine>,
    pub workers: Vec<Worker>,
    pub services: Vec<Service>,
    pub legacy_jobs: Vec<PipelineBuildJob>,
    pub status_latency: Duration,
    pub workers_latency: Duration,
    pub worker_models_latency: Duration,
    pub queue_count_latency: Duration,
}

/// Workflow queue for one tab.
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub tab: QueueTab,
    pub jobs: Vec<WorkflowNodeJobRun>,
    pub latency: Duration,
}

async fn timed<T>(call: impl Future<Output = MonitorResult<T>>) -> MonitorResult<(T, Duration)> {
    let start = Instant::now();
    let value = call.await?;
    Ok((value, start.elapsed()))
}

/// Periodically fetches snapshots and posts them to the event loop.
pub struct Poller<A> {
    api: A,
    tx: mpsc::UnboundedSender<AppEvent>,
    tab_rx: watch::Receiver<QueueTab>,
    ui_url_known: bool,
    user: Option<User>,
}

impl<A: MonitoringApi> Poller<A> {
    pub fn new(
        api: A,
        tx: mpsc::UnboundedSender<AppEvent>,
        tab_rx: watch::Receiver<QueueTab>,
    ) -> Self {
        Self {
            api,
            tx,
            tab_rx,
            ui_url_known: false,
            user: None,
        }
    }

    /// Poll until the event loop goes away.
    ///
    /// A full refresh runs every `interval`; a tab change triggers an
    /// immediate queue-only refresh. Ticks missed during a slow fetch are
    /// not replayed.
    pub async fn run(mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let platform = self.fetch_platform().await;
                    if !self.send(DataEvent::Platform(platform.map_err(|e| e.to_string()))) {
                        return;
                    }
                    let tab = *self.tab_rx.borrow_and_update();
                    if !self.send_queue(tab).await {
                        return;
                    }
                }
                changed = self.tab_rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    let tab = *self.tab_rx.borrow_and_update();
                    if !self.send_queue(tab).await {
                        return;
                    }
                }
            }
        }
    }

    async fn send_queue(&self, tab: QueueTab) -> bool {
        let queue = self.fetch_queue(tab).await;
        self.send(DataEvent::Queue(queue.map_err(|e| e.to_string())))
    }

    fn send(&self, event: DataEvent) -> bool {
        self.tx.send(AppEvent::Data(event)).is_ok()
    }

    /// Fetch everything except the workflow queue. Stops at the first error.
    pub async fn fetch_platform(&mut self) -> MonitorResult<PlatformSnapshot> {
        let mut snapshot = PlatformSnapshot::default();

        if !self.ui_url_known {
            match self.api.ui_url().await {
                Ok(url) => {
                    self.ui_url_known = true;
                    snapshot.ui_url = url;
                }
                Err(e) => warn!(error = %e, "Cannot get UI URL, will retry"),
            }
        }

        let user = match &self.user {
            Some(user) => user.clone(),
            None => {
                let user = self.api.current_user().await?;
                self.user = Some(user.clone());
                user
            }
        };

        let (status_lines, status_latency) = timed(self.api.global_status()).await?;
        let (workers, workers_latency) = timed(self.api.workers()).await?;
        let services = if user.admin {
            self.api.services_by_type(HATCHERY_SERVICE_TYPE).await?
        } else {
            Vec::new()
        };
        let (_, worker_models_latency) = timed(self.api.worker_models_count()).await?;
        let legacy_jobs = self.api.legacy_queue().await?;
        let (_, queue_count_latency) = timed(self.api.workflow_queue_count()).await?;

        debug!(
            status_ms = status_latency.as_millis(),
            workers_ms = workers_latency.as_millis(),
            workers = workers.len(),
            legacy_jobs = legacy_jobs.len(),
            "Platform snapshot fetched"
        );

        snapshot.user = user;
        snapshot.status_lines = status_lines;
        snapshot.workers = workers;
        snapshot.services = services;
        snapshot.legacy_jobs = legacy_jobs;
        snapshot.status_latency = status_latency;
        snapshot.workers_latency = workers_latency;
        snapshot.worker_models_latency = worker_models_latency;
        snapshot.queue_count_latency = queue_count_latency;
        Ok(snapshot)
    }

    /// Fetch the workflow queue for `tab`.
    pub async fn fetch_queue(&self, tab: QueueTab) -> MonitorResult<QueueSnapshot> {
        let (jobs, latency) = timed(self.api.workflow_queue(tab.statuses())).await?;
        debug!(?tab, jobs = jobs.len(), latency_ms = latency.as_millis(), "Queue fetched");
        Ok(QueueSnapshot { tab, jobs, latency })
    }
}

/// `{"count": n}` answer of the queue count endpoint.
#[derive(Debug, Deserialize)]
struct QueueCount {
    #[serde(default)]
    count: u64,
}

/// `{"message": "..."}` error body returned by the API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// [`MonitoringApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
}

impl HttpApi {
    /// Build a client from the configuration.
    pub fn new(config: &MonitorConfig) -> MonitorResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Requested-With", HeaderValue::from_static("X-CDS-SDK"));
        if let Some(token) = &config.session_token {
            let value = HeaderValue::from_str(token)
                .map_err(|_| MonitorError::Config("session token is not a valid header value".into()))?;
            headers.insert("Session-Token", value);
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| MonitorError::Http {
                path: String::new(),
                source,
            })?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> MonitorResult<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| MonitorError::Http {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| MonitorError::Http {
            path: path.to_string(),
            source,
        })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_string());
            return Err(MonitorError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| MonitorError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

impl MonitoringApi for HttpApi {
    async fn ui_url(&self) -> MonitorResult<Option<String>> {
        let config: HashMap<String, String> = self.get_json("/config/user").await?;
        Ok(config.get(CONFIG_URL_UI_KEY).cloned())
    }

    async fn current_user(&self) -> MonitorResult<User> {
        match &self.username {
            Some(name) => self.get_json(&format!("/user/{name}")).await,
            None => Ok(User::default()),
        }
    }

    async fn global_status(&self) -> MonitorResult<Vec<StatusLine>> {
        let status: MonitoringStatus = self.get_json("/mon/status").await?;
        Ok(status.lines)
    }

    async fn workers(&self) -> MonitorResult<Vec<Worker>> {
        self.get_json("/worker").await
    }

    async fn services_by_type(&self, kind: &str) -> MonitorResult<Vec<Service>> {
        self.get_json(&format!("/admin/services?type={kind}")).await
    }

    async fn worker_models_count(&self) -> MonitorResult<usize> {
        let models: Vec<serde_json::Value> = self.get_json("/worker/model").await?;
        Ok(models.len())
    }

    async fn legacy_queue(&self) -> MonitorResult<Vec<PipelineBuildJob>> {
        self.get_json("/queue?status=all").await
    }

    async fn workflow_queue(&self, statuses: &[Status]) -> MonitorResult<Vec<WorkflowNodeJobRun>> {
        let query: Vec<String> = statuses.iter().map(|s| format!("status={s}")).collect();
        let path = if query.is_empty() {
            "/queue/workflows".to_string()
        } else {
            format!("/queue/workflows?{}", query.join("&"))
        };
        self.get_json(&path).await
    }

    async fn workflow_queue_count(&self) -> MonitorResult<u64> {
        let count: QueueCount = self.get_json("/queue/workflows/count").await?;
        Ok(count.count)
    }
}
