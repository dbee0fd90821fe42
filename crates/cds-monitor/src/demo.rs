//! Demo mode - serves fake snapshots for trying the dashboard offline

use std::sync::Mutex;

use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::data::MonitoringApi;
use crate::error::MonitorResult;
use crate::model::{
    Action, BookedBy, ExecutedJob, LineStatus, Parameter, PipelineBuildJob, Requirement, Service,
    Status, StatusLine, User, Worker, WorkflowNodeJobRun,
};

const HATCHERIES: [&str; 3] = ["hatchery-swarm", "hatchery-openstack", "hatchery-marathon"];
const PROJECTS: [(&str, &str, &str); 4] = [
    ("CORE", "api", "build-and-test"),
    ("CORE", "ui", "lint"),
    ("INFRA", "terraform", "plan"),
    ("DATA", "etl", "nightly"),
];
const USERS: [&str; 3] = ["alice", "bob", "carol"];

/// Random but plausible CDS platform.
pub struct DemoApi {
    rng: Mutex<StdRng>,
}

impl Default for DemoApi {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoApi {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Same data every run, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut rng)
    }
}

fn queued_recently(rng: &mut StdRng) -> DateTime<Utc> {
    Utc::now() - TimeDelta::seconds(rng.gen_range(0..120))
}

fn demo_parameters(rng: &mut StdRng, workflow: bool) -> Vec<Parameter> {
    let (project, app, pipeline) = PROJECTS[rng.gen_range(0..PROJECTS.len())];
    let mut params = vec![
        Parameter::new("cds.project", project),
        Parameter::new("cds.triggered_by.username", USERS[rng.gen_range(0..USERS.len())]),
        Parameter::new("git.branch", if rng.gen_bool(0.7) { "master" } else { "feature/demo" }),
    ];
    if workflow {
        let run = rng.gen_range(1..500).to_string();
        params.push(Parameter::new("cds.workflow", format!("{app}-wf")));
        params.push(Parameter::new("cds.node", pipeline));
        params.push(Parameter::new("cds.run", format!("{run}.0")));
        params.push(Parameter::new("cds.run.number", run));
    } else {
        params.push(Parameter::new("cds.application", app));
        params.push(Parameter::new("cds.pipeline", pipeline));
        params.push(Parameter::new("cds.environment", "NoEnv"));
        params.push(Parameter::new("cds.buildNumber", rng.gen_range(1..300).to_string()));
        params.push(Parameter::new("cds.version", rng.gen_range(1..50).to_string()));
    }
    params
}

fn demo_job(rng: &mut StdRng, status: Status) -> (ExecutedJob, BookedBy) {
    let model = if rng.gen_bool(0.5) { "debian9-docker" } else { "ubuntu-vm" };
    let job = ExecutedJob {
        action: Action {
            name: "build".into(),
            requirements: vec![Requirement {
                name: model.into(),
                kind: "model".into(),
                value: model.into(),
            }],
        },
        worker_name: if status == Status::Building {
            format!("{model}-{:04x}", rng.gen_range(0..0xffff))
        } else {
            String::new()
        },
        worker_id: if status == Status::Building {
            rng.gen_range(1..9999).to_string()
        } else {
            String::new()
        },
    };
    let booked_by = if status == Status::Waiting && rng.gen_bool(0.3) {
        BookedBy {
            id: rng.gen_range(1..4),
            name: HATCHERIES[rng.gen_range(0..HATCHERIES.len())].into(),
        }
    } else {
        BookedBy::default()
    };
    (job, booked_by)
}

fn random_status(rng: &mut StdRng, statuses: &[Status]) -> Status {
    statuses[rng.gen_range(0..statuses.len())]
}

impl MonitoringApi for DemoApi {
    async fn ui_url(&self) -> MonitorResult<Option<String>> {
        Ok(Some("https://cds.demo.local".to_string()))
    }

    async fn current_user(&self) -> MonitorResult<User> {
        Ok(User {
            username: "demo".into(),
            admin: true,
        })
    }

    async fn global_status(&self) -> MonitorResult<Vec<StatusLine>> {
        Ok(self.with_rng(|rng| {
            let mut lines = vec![
                StatusLine {
                    component: "Global/Version".into(),
                    status: LineStatus::Ok,
                    message: "demo".into(),
                },
                StatusLine {
                    component: "Global/Hatcheries".into(),
                    status: LineStatus::Ok,
                    message: format!("{} running", HATCHERIES.len()),
                },
                StatusLine {
                    component: "DB/Connections".into(),
                    status: LineStatus::Ok,
                    message: "12".into(),
                },
            ];
            if rng.gen_bool(0.4) {
                lines.push(StatusLine {
                    component: "Cache/Redis".into(),
                    status: LineStatus::Warn,
                    message: "latency above 50ms".into(),
                });
            }
            if rng.gen_bool(0.1) {
                lines.push(StatusLine {
                    component: "Hooks".into(),
                    status: LineStatus::Other("AL".into()),
                    message: "unreachable".into(),
                });
            }
            lines
        }))
    }

    async fn workers(&self) -> MonitorResult<Vec<Worker>> {
        Ok(self.with_rng(|rng| {
            (0..rng.gen_range(5..25))
                .map(|i| {
                    let hatchery = if rng.gen_bool(0.1) {
                        ""
                    } else {
                        HATCHERIES[rng.gen_range(0..HATCHERIES.len())]
                    };
                    let status = random_status(
                        rng,
                        &[Status::Waiting, Status::Building, Status::Building, Status::Checking, Status::Disabled],
                    );
                    Worker {
                        id: format!("{i}"),
                        name: format!("worker-{i}"),
                        status: status.to_string(),
                        hatchery_id: 0,
                        hatchery_name: hatchery.to_string(),
                    }
                })
                .collect()
        }))
    }

    async fn services_by_type(&self, kind: &str) -> MonitorResult<Vec<Service>> {
        Ok(HATCHERIES
            .iter()
            .enumerate()
            .map(|(i, name)| Service {
                id: i as i64 + 1,
                name: (*name).to_string(),
                kind: kind.to_string(),
            })
            .collect())
    }

    async fn worker_models_count(&self) -> MonitorResult<usize> {
        Ok(2)
    }

    async fn legacy_queue(&self) -> MonitorResult<Vec<PipelineBuildJob>> {
        Ok(self.with_rng(|rng| {
            (0..rng.gen_range(0..4))
                .map(|i| {
                    let status = random_status(rng, &[Status::Waiting, Status::Building]);
                    let (job, booked_by) = demo_job(rng, status);
                    PipelineBuildJob {
                        id: 1000 + i,
                        status: status.to_string(),
                        queued: queued_recently(rng),
                        parameters: demo_parameters(rng, false),
                        job,
                        booked_by,
                    }
                })
                .collect()
        }))
    }

    async fn workflow_queue(&self, statuses: &[Status]) -> MonitorResult<Vec<WorkflowNodeJobRun>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.with_rng(|rng| {
            (0..rng.gen_range(2..15))
                .map(|i| {
                    let status = random_status(rng, statuses);
                    let (job, booked_by) = demo_job(rng, status);
                    WorkflowNodeJobRun {
                        id: 5000 + i,
                        status: status.to_string(),
                        queued: queued_recently(rng),
                        parameters: demo_parameters(rng, true),
                        job,
                        booked_by,
                    }
                })
                .collect()
        }))
    }

    async fn workflow_queue_count(&self) -> MonitorResult<u64> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn workflow_queue_respects_filter() {
        let api = DemoApi::seeded(7);
        let jobs = api.workflow_queue(&[Status::Building]).await.unwrap();
        assert!(!jobs.is_empty());
        assert!(jobs.iter().all(|j| j.status == "Building"));
        assert!(jobs.iter().all(|j| !j.job.worker_name.is_empty()));
    }

    #[tokio::test]
    async fn legacy_jobs_have_drill_down_parameters() {
        let api = DemoApi::seeded(11);
        for _ in 0..5 {
            for job in api.legacy_queue().await.unwrap() {
                assert!(job.parameters.iter().any(|p| p.name == "cds.buildNumber"));
            }
        }
    }

    #[tokio::test]
    async fn demo_user_is_admin() {
        let api = DemoApi::default();
        assert!(api.current_user().await.unwrap().admin);
        assert_eq!(api.services_by_type("hatchery").await.unwrap().len(), HATCHERIES.len());
    }
}
